use super::class_names::ClassNames;
use super::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for object detection.
///
/// Inference backends may keep per-call scratch state, hence `&mut self`.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;

    /// Labels for the class ids this detector emits.
    fn class_names(&self) -> &ClassNames;
}
