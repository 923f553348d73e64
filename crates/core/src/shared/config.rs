//! Run parameters for the two entry points.
//!
//! Defaults reproduce the constants the tools have always shipped with.
//! A JSON file can override any subset of fields; the CLI layers its flags
//! on top of whatever was loaded.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_FRAMES_DIR, DEFAULT_FRAME_EXTENSION, DEFAULT_FRAME_PREFIX,
    DEFAULT_IMAGE_PATH, DEFAULT_IOU_THRESHOLD, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DETECTIONS,
    DEFAULT_MODEL_PATH, DEFAULT_PROJECT_DIR, DEFAULT_RUN_NAME, DEFAULT_TARGET_RATE,
    DEFAULT_VIDEO_PATH,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What to do when the decoder fails partway through a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrorPolicy {
    /// Stop sampling and report success with the frames saved so far.
    #[default]
    EndOfStream,
    /// Abort the run with [`PipelineError::DecodeFailed`](super::error::PipelineError::DecodeFailed).
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    /// Frames to keep per second of source video.
    pub target_rate: f64,
    pub filename_prefix: String,
    /// Also selects the encoder.
    pub image_extension: String,
    /// 1-100, only used for JPEG output.
    pub jpeg_quality: u8,
    pub on_decode_error: DecodeErrorPolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            video_path: PathBuf::from(DEFAULT_VIDEO_PATH),
            output_dir: PathBuf::from(DEFAULT_FRAMES_DIR),
            target_rate: DEFAULT_TARGET_RATE,
            filename_prefix: DEFAULT_FRAME_PREFIX.to_string(),
            image_extension: DEFAULT_FRAME_EXTENSION.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            on_decode_error: DecodeErrorPolicy::default(),
        }
    }
}

impl ExtractionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub model_path: PathBuf,
    pub image_path: PathBuf,
    pub confidence: f64,
    pub iou_threshold: f64,
    pub max_detections: usize,
    /// Parent of the run directories (`runs/detect`).
    pub project_dir: PathBuf,
    /// Base name of the run directory (`predict`, `predict2`, ...).
    pub run_name: String,
    /// Reuse `project_dir/run_name` instead of picking the next free suffix.
    pub exist_ok: bool,
    pub save: bool,
    pub save_txt: bool,
    /// Box outline width in pixels; scaled to the image when unset.
    pub line_width: Option<u32>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            image_path: PathBuf::from(DEFAULT_IMAGE_PATH),
            confidence: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            project_dir: PathBuf::from(DEFAULT_PROJECT_DIR),
            run_name: DEFAULT_RUN_NAME.to_string(),
            exist_ok: false,
            save: true,
            save_txt: false,
            line_width: None,
        }
    }
}

impl DetectionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_json(path)
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
