/// Audio effects module
///
/// Time-stepped building blocks used by transitions and sound effects:
/// linear fade ramps, playback levels, and release timers.

pub mod fade;
pub mod limiter;
pub mod volume;

pub use fade::{lerp, Ramp};
pub use limiter::ReleaseTimer;
pub use volume::Levels;
