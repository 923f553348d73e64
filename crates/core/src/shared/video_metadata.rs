/// Stream properties reported by a [`VideoReader`](crate::video::domain::video_reader::VideoReader)
/// when a source is opened.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Native frame rate. `0.0` when the container does not report one.
    pub fps: f64,
    /// Frame count from the container header. Often 0 for streams that
    /// don't record it, so never use it to bound decoding.
    pub total_frames: usize,
    pub codec: String,
}

impl VideoMetadata {
    /// Whether the native frame rate can be used for sampling.
    pub fn has_usable_fps(&self) -> bool {
        self.fps.is_finite() && self.fps > 0.0
    }
}
