use std::path::{Path, PathBuf};

use crate::shared::constants::{DEFAULT_FRAME_EXTENSION, DEFAULT_FRAME_PREFIX, FRAME_INDEX_WIDTH};

/// Builds output filenames for sampled frames: `<prefix><index>.<ext>`,
/// with the index zero-padded to at least five digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNamer {
    prefix: String,
    extension: String,
}

impl FrameNamer {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            prefix: prefix.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn file_name(&self, saved_index: usize) -> String {
        format!(
            "{}{saved_index:0width$}.{}",
            self.prefix,
            self.extension,
            width = FRAME_INDEX_WIDTH
        )
    }

    pub fn path_in(&self, dir: &Path, saved_index: usize) -> PathBuf {
        dir.join(self.file_name(saved_index))
    }
}

impl Default for FrameNamer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_PREFIX, DEFAULT_FRAME_EXTENSION)
    }
}
