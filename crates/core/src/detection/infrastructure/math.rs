//! Box geometry shared by the detection backends.

use crate::detection::domain::detection::Detection;

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Class-aware greedy NMS.
///
/// Sorts by confidence descending and drops any box overlapping a kept box
/// of the same class by more than `iou_thresh`. At most `max_det` boxes are
/// returned.
pub fn nms(mut dets: Vec<Detection>, iou_thresh: f64, max_det: usize) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::new();
    for det in dets {
        if keep.len() >= max_det {
            break;
        }
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && bbox_iou(&k.bbox(), &det.bbox()) > iou_thresh);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}
