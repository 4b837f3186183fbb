/// Playback levels
///
/// Target volume, pitch and spatial blend for an instance.

/// Level settings applied to a playback instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    /// Volume multiplier (0.0-1.0)
    volume: f32,

    /// Playback speed multiplier, never negative
    pitch: f32,

    /// 0.0 is fully 2D, 1.0 fully 3D
    spatial_blend: f32,
}

impl Levels {
    pub fn new(volume: f32, pitch: f32, spatial_blend: f32) -> Self {
        Self {
            volume: volume.clamp(0.0, 1.0),
            pitch: pitch.max(0.0),
            spatial_blend: spatial_blend.clamp(0.0, 1.0),
        }
    }

    /// Full volume, unit pitch, fully 2D
    pub fn unit() -> Self {
        Self::new(1.0, 1.0, 0.0)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn spatial_blend(&self) -> f32 {
        self.spatial_blend
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch.max(0.0);
        self
    }

    pub fn with_spatial_blend(mut self, blend: f32) -> Self {
        self.spatial_blend = blend.clamp(0.0, 1.0);
        self
    }
}

impl Default for Levels {
    fn default() -> Self {
        Self::unit()
    }
}
