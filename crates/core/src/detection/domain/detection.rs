/// One detected object in source-image pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub class_id: usize,
    pub confidence: f64,
}

impl Detection {
    pub fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Clamps the box to `[0, width] x [0, height]`.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let w = width as f64;
        let h = height as f64;
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
            ..self.clone()
        }
    }

    /// `(cx, cy, w, h)` normalised by the image size, the YOLO label layout.
    pub fn normalized_xywh(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let w = width.max(1) as f64;
        let h = height.max(1) as f64;
        (
            (self.x1 + self.x2) / 2.0 / w,
            (self.y1 + self.y2) / 2.0 / h,
            self.width() / w,
            self.height() / h,
        )
    }
}
