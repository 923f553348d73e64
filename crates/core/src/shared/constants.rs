pub const DEFAULT_VIDEO_PATH: &str = "videoplayback.mp4";
pub const DEFAULT_FRAMES_DIR: &str = "video_frames_dataset";
/// Frames kept per second of source video.
pub const DEFAULT_TARGET_RATE: f64 = 1.0;
pub const DEFAULT_FRAME_PREFIX: &str = "frame_";
pub const DEFAULT_FRAME_EXTENSION: &str = "jpg";
/// Minimum digits in a saved frame's sequence number.
pub const FRAME_INDEX_WIDTH: usize = 5;
/// Matches OpenCV's `imwrite` default so sampled frames look the same as
/// the ones annotators already have.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

pub const DEFAULT_MODEL_PATH: &str = "best.onnx";
pub const DEFAULT_IMAGE_PATH: &str = "image.png";
pub const DEFAULT_CONFIDENCE: f64 = 0.25;
/// Class-aware NMS IoU threshold (Ultralytics predict default).
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MAX_DETECTIONS: usize = 300;
pub const DEFAULT_PROJECT_DIR: &str = "runs/detect";
pub const DEFAULT_RUN_NAME: &str = "predict";
pub const LABELS_DIR_NAME: &str = "labels";
