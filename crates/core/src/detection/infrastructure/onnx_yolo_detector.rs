/// Ultralytics YOLO object detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, decoding of the
/// `[1, 4 + num_classes, num_anchors]` head, and class-aware NMS.
use std::path::Path;

use image::imageops::FilterType;

use crate::detection::domain::class_names::ClassNames;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DETECTIONS};
use crate::shared::frame::Frame;

use super::math::nms;
use super::onnx_session::load_session;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Letterbox padding value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Thresholds applied after inference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloThresholds {
    pub confidence: f64,
    pub iou: f64,
    pub max_detections: usize,
}

impl Default for YoloThresholds {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            iou: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }
}

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    class_names: ClassNames,
    thresholds: YoloThresholds,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX export and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (NCHW),
    /// falling back to 640 when it is dynamic. Class names come from the
    /// `names` metadata entry Ultralytics writes on export.
    pub fn new(
        model_path: &Path,
        thresholds: YoloThresholds,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        let class_names = session
            .metadata()
            .ok()
            .and_then(|meta| meta.custom("names").ok().flatten())
            .and_then(|text| ClassNames::parse_metadata(&text))
            .unwrap_or_default();

        log::info!(
            "Loaded model {} ({} classes, {input_size}x{input_size} input)",
            model_path.display(),
            class_names.len()
        );

        Ok(Self {
            session,
            class_names,
            thresholds,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size)?;

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let candidates = decode_output(
            data,
            tensor.shape(),
            self.thresholds.confidence,
            &letterbox,
        )?;
        let detections = nms(
            candidates,
            self.thresholds.iou,
            self.thresholds.max_detections,
        )
        .into_iter()
        .map(|d| d.clamped(frame.width(), frame.height()))
        .collect();

        Ok(detections)
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Mapping between letterboxed model coordinates and the source frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size` and normalise
/// to an NCHW float32 tensor.
///
/// Resizing is bilinear, matching the `INTER_LINEAR` resize of the
/// Ultralytics preprocessing the models are exported from.
fn letterbox(
    frame: &Frame,
    target_size: u32,
) -> Result<(ndarray::Array4<f32>, Letterbox), Box<dyn std::error::Error>> {
    let image = frame
        .to_rgb_image()
        .ok_or("YOLO input must be a 3-channel RGB frame")?;
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).clamp(1, target_size);
    let new_h = ((fh * scale).round() as u32).clamp(1, target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let resized = image::imageops::resize(&image, new_w, new_h, FilterType::Triangle);

    let size = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let ty = (pad_y + y) as usize;
        let tx = (pad_x + x) as usize;
        for c in 0..3 {
            tensor[[0, c, ty, tx]] = pixel[c] as f32 / 255.0;
        }
    }

    Ok((
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    ))
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Decodes the raw detection head into candidate boxes above `confidence`.
///
/// Accepts `[1, features, anchors]` (the Ultralytics export layout) or the
/// transposed `[1, anchors, features]`; the smaller axis is taken as the
/// feature axis. Each feature row is `cx, cy, w, h, score_0 .. score_n`.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    confidence: f64,
    letterbox: &Letterbox,
) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_anchors, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Err(format!("YOLO output has no class scores: {shape:?}").into());
    }
    if data.len() < num_anchors * num_feats {
        return Err("YOLO output is shorter than its shape".into());
    }

    let value = |anchor: usize, feat: usize| -> f64 {
        let i = if transposed {
            feat * num_anchors + anchor
        } else {
            anchor * num_feats + feat
        };
        data[i] as f64
    };

    let mut candidates = Vec::new();
    for anchor in 0..num_anchors {
        let (class_id, score) = (4..num_feats)
            .map(|f| (f - 4, value(anchor, f)))
            .fold((0, f64::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if score < confidence {
            continue;
        }

        let cx = value(anchor, 0);
        let cy = value(anchor, 1);
        let w = value(anchor, 2);
        let h = value(anchor, 3);
        let (x1, y1) = letterbox.to_source(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.to_source(cx + w / 2.0, cy + h / 2.0);

        candidates.push(Detection {
            x1,
            y1,
            x2,
            y2,
            class_id,
            confidence: score,
        });
    }

    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
