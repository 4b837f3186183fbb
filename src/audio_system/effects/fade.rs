/// Linear fade ramp
///
/// A ramp is a progress cursor over a fixed duration. It is advanced once per
/// frame tick and sampled with [`Ramp::sample`] to produce interpolated values.

/// Linear interpolation with `t` clamped to `[0, 1]`
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Time-stepped ramp cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    /// Total duration in seconds
    duration: f32,

    /// Elapsed time in seconds
    elapsed: f32,
}

impl Ramp {
    /// Create a ramp over `duration` seconds. Negative or NaN durations become 0.
    pub fn new(duration: f32) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            duration,
            elapsed: 0.0,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance the cursor by one frame
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// True while the ramp has not reached its duration
    pub fn is_running(&self) -> bool {
        self.elapsed < self.duration
    }

    /// Fraction of the ramp completed, in `[0, 1]`. A zero-length ramp is always complete.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Value between `from` and `to` at the current cursor
    pub fn sample(&self, from: f32, to: f32) -> f32 {
        lerp(from, to, self.progress())
    }
}
