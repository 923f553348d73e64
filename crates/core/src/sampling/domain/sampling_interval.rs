use std::num::NonZeroUsize;

/// Why a stride could not be derived from the two rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntervalError {
    /// Native rate is zero, negative, NaN or infinite.
    UnusableNativeRate,
    /// Target rate is zero, negative, NaN or infinite.
    InvalidTargetRate,
    /// Target rate exceeds the native rate, so the stride floors to zero.
    TooSmall,
}

/// Decimation stride: keep one decoded frame out of every `get()`.
///
/// Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingInterval(NonZeroUsize);

impl SamplingInterval {
    /// `floor(native_fps / target_rate)`.
    pub fn new(native_fps: f64, target_rate: f64) -> Result<Self, IntervalError> {
        if !native_fps.is_finite() || native_fps <= 0.0 {
            return Err(IntervalError::UnusableNativeRate);
        }
        if !target_rate.is_finite() || target_rate <= 0.0 {
            return Err(IntervalError::InvalidTargetRate);
        }
        let stride = (native_fps / target_rate).floor();
        if stride > usize::MAX as f64 {
            return Ok(Self(NonZeroUsize::MAX));
        }
        NonZeroUsize::new(stride as usize)
            .map(Self)
            .ok_or(IntervalError::TooSmall)
    }

    pub fn every(stride: NonZeroUsize) -> Self {
        Self(stride)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Whether the frame at decode position `frame_count` is kept.
    /// The first frame of every block of `get()` frames is.
    pub fn keeps(self, frame_count: usize) -> bool {
        frame_count % self.0.get() == 0
    }

    /// Frames kept from a source of `decoded` frames: `ceil(decoded / stride)`.
    pub fn kept_count(self, decoded: usize) -> usize {
        decoded.div_ceil(self.0.get())
    }
}
