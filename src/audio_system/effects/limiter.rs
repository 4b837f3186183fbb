/// Release timer
///
/// Counts down the remaining lifetime of a fire-and-forget instance.

/// Lifetime countdown for a transient playback instance
#[derive(Debug, Clone, Copy)]
pub struct ReleaseTimer {
    /// Seconds left before the instance is released
    remaining: f32,
}

impl ReleaseTimer {
    pub fn new(seconds: f32) -> Self {
        let remaining = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        Self { remaining }
    }

    /// Lifetime of a buffer played at `pitch`: `duration / pitch`.
    /// A non-positive pitch never finishes on its own, so it releases on the next tick.
    pub fn for_playback(duration: f32, pitch: f32) -> Self {
        if pitch > 0.0 {
            Self::new(duration / pitch)
        } else {
            Self::new(0.0)
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Count down by `dt`; returns true once the timer has expired
    pub fn advance(&mut self, dt: f32) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.remaining = (self.remaining - dt).max(0.0);
        }
        self.remaining <= 0.0
    }
}
