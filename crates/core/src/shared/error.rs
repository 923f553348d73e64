use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// What a missing or unreadable path was supposed to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Video,
    Image,
    Model,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Video => write!(f, "video file"),
            ResourceKind::Image => write!(f, "image file"),
            ResourceKind::Model => write!(f, "model file"),
        }
    }
}

/// Failures of the frame sampling and detection use cases.
///
/// All variants are fatal to the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{kind} not found: {}", path.display())]
    ResourceNotFound { kind: ResourceKind, path: PathBuf },

    #[error("could not open {kind} {}: {source}", path.display())]
    ResourceUnreadable {
        kind: ResourceKind,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    #[error("could not get frame rate of {}", path.display())]
    UnreadableMetadata { path: PathBuf },

    #[error("target rate must be a positive number of frames per second, got {rate}")]
    InvalidTargetRate { rate: f64 },

    #[error("target rate {target_rate} fps exceeds the native rate of {native_fps} fps")]
    IntervalTooSmall { native_fps: f64, target_rate: f64 },

    #[error("decoding failed at frame {frame_index} after saving {saved} frames: {source}")]
    DecodeFailed {
        frame_index: usize,
        saved: usize,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    #[error("inference failed: {source}")]
    Inference {
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Fails with [`PipelineError::ResourceNotFound`] unless `path` exists.
pub fn ensure_exists(kind: ResourceKind, path: &Path) -> Result<(), PipelineError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::ResourceNotFound {
            kind,
            path: path.to_path_buf(),
        })
    }
}
