use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

/// Ultralytics' default class palette.
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

/// Draws each detection as a rectangle outline in its class colour.
///
/// Line width scales with the image like Ultralytics' plotting: a fixed
/// width wins when one is given.
pub struct BoxAnnotator {
    line_width: Option<u32>,
}

impl BoxAnnotator {
    pub fn new() -> Self {
        Self { line_width: None }
    }

    pub fn with_line_width(line_width: u32) -> Self {
        Self {
            line_width: Some(line_width.max(1)),
        }
    }

    pub fn class_color(class_id: usize) -> [u8; 3] {
        PALETTE[class_id % PALETTE.len()]
    }

    fn line_width_for(&self, width: u32, height: u32) -> u32 {
        self.line_width.unwrap_or_else(|| {
            let auto = ((width + height) as f64 / 2.0 * 0.003).round() as u32;
            auto.max(2)
        })
    }
}

impl Default for BoxAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAnnotator for BoxAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if frame.channels() != 3 {
            return Err(format!("Expected an RGB frame, got {} channels", frame.channels()).into());
        }
        let fw = frame.width() as usize;
        let fh = frame.height() as usize;
        if fw == 0 || fh == 0 {
            return Ok(());
        }
        let lw = self.line_width_for(frame.width(), frame.height()) as usize;
        let mut pixels = frame.as_ndarray_mut();

        for det in detections {
            let color = Self::class_color(det.class_id);
            let x1 = (det.x1.max(0.0) as usize).min(fw - 1);
            let y1 = (det.y1.max(0.0) as usize).min(fh - 1);
            let x2 = (det.x2.max(0.0) as usize).min(fw - 1);
            let y2 = (det.y2.max(0.0) as usize).min(fh - 1);
            if x2 < x1 || y2 < y1 {
                continue;
            }

            // Strokes grow inward so the outline stays on the box
            for y in y1..=y2 {
                for x in x1..=x2 {
                    let on_edge = x < x1 + lw || x + lw > x2 || y < y1 + lw || y + lw > y2;
                    if on_edge {
                        for (c, value) in color.iter().enumerate() {
                            pixels[[y, x, c]] = *value;
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(w: u32, h: u32) -> Frame {
        Frame::new(vec![0u8; (w * h * 3) as usize], w, h, 3, 0)
    }

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, class_id: usize) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            class_id,
            confidence: 0.9,
        }
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let arr = frame.as_ndarray();
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    #[test]
    fn test_outline_drawn_interior_untouched() {
        let mut frame = blank(100, 100);
        BoxAnnotator::with_line_width(2)
            .annotate(&mut frame, &[det(10.0, 20.0, 60.0, 80.0, 0)])
            .unwrap();

        let red = BoxAnnotator::class_color(0);
        assert_eq!(pixel(&frame, 10, 50), red);
        assert_eq!(pixel(&frame, 11, 50), red);
        assert_eq!(pixel(&frame, 60, 50), red);
        assert_eq!(pixel(&frame, 35, 20), red);
        assert_eq!(pixel(&frame, 35, 80), red);
        assert_eq!(pixel(&frame, 35, 50), [0, 0, 0]);
        assert_eq!(pixel(&frame, 5, 50), [0, 0, 0]);
    }

    #[test]
    fn test_class_colors_differ_and_wrap() {
        assert_ne!(BoxAnnotator::class_color(0), BoxAnnotator::class_color(1));
        assert_eq!(BoxAnnotator::class_color(3), BoxAnnotator::class_color(23));
    }

    #[test]
    fn test_box_outside_frame_is_clipped() {
        let mut frame = blank(40, 30);
        BoxAnnotator::with_line_width(1)
            .annotate(&mut frame, &[det(-20.0, -20.0, 500.0, 500.0, 2)])
            .unwrap();
        let color = BoxAnnotator::class_color(2);
        assert_eq!(pixel(&frame, 0, 0), color);
        assert_eq!(pixel(&frame, 39, 29), color);
        assert_eq!(pixel(&frame, 20, 15), [0, 0, 0]);
    }

    #[test]
    fn test_auto_line_width_has_floor() {
        let annotator = BoxAnnotator::new();
        assert_eq!(annotator.line_width_for(100, 100), 2);
        assert_eq!(annotator.line_width_for(1920, 1080), 5);
    }

    #[test]
    fn test_no_detections_leaves_frame_unchanged() {
        let mut frame = blank(8, 8);
        BoxAnnotator::new().annotate(&mut frame, &[]).unwrap();
        assert!(frame.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rejects_non_rgb() {
        let mut frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        assert!(BoxAnnotator::new()
            .annotate(&mut frame, &[det(0.0, 0.0, 2.0, 2.0, 0)])
            .is_err());
    }
}
