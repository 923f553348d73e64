use std::fs;
use std::path::Path;

use crate::detection::domain::detection::Detection;

/// One line per detection: `class cx cy w h conf`, box normalised to the
/// image size.
pub fn format_labels(detections: &[Detection], width: u32, height: u32) -> String {
    detections
        .iter()
        .map(|d| {
            let (cx, cy, w, h) = d.normalized_xywh(width, height);
            format!(
                "{} {cx:.6} {cy:.6} {w:.6} {h:.6} {:.6}\n",
                d.class_id, d.confidence
            )
        })
        .collect()
}

pub fn write_labels(
    path: &Path,
    detections: &[Detection],
    width: u32,
    height: u32,
) -> std::io::Result<()> {
    fs::write(path, format_labels(detections, width, height))
}
