//! Scalar signal-smoothing primitives.
//!
//! Small, dependency-free building blocks for taming noisy per-frame
//! tracking signals. The application layer decides which channel gets
//! which smoothing constant; this crate only provides the filters.

/// Exponential smoother: `smoothed' = smoothed + (raw - smoothed) * alpha`.
///
/// `alpha` is in `(0, 1]`: higher values track the raw signal more
/// responsively, lower values lag behind it more smoothly. The first
/// sample snaps the smoother directly to the raw value. When no new
/// sample arrives for a frame, simply don't call [`update`](Self::update);
/// the smoother holds its last value.
#[derive(Debug, Clone)]
pub struct ExpSmoother {
    alpha: f32,
    value: Option<f32>,
}

impl ExpSmoother {
    /// Create a smoother with the given blend factor.
    ///
    /// Values outside `(0, 1]` are clamped into range rather than
    /// rejected.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(1e-4, 1.0),
            value: None,
        }
    }

    /// Feed one raw sample and return the new smoothed value.
    pub fn update(&mut self, raw: f32) -> f32 {
        let next = match self.value {
            Some(prev) => prev + (raw - prev) * self.alpha,
            None => raw,
        };
        self.value = Some(next);
        next
    }

    /// Current smoothed value, if at least one sample has been seen.
    pub fn value(&self) -> Option<f32> {
        self.value
    }

    /// Current smoothed value, or `default` before the first sample.
    pub fn value_or(&self, default: f32) -> f32 {
        self.value.unwrap_or(default)
    }

    /// Forget all state; the next sample snaps directly.
    pub fn reset(&mut self) {
        self.value = None;
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

/// Zero out values whose magnitude is below `deadzone`.
///
/// Used on centered signals (head rotation offsets) to suppress
/// micro-jitter around the neutral pose before smoothing.
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}
