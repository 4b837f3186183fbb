//! Audio fade engine
//!
//! Cross-fades and sequential fades for a music and an ambient channel,
//! fire-and-forget sound effects, and fade-out stops and pause toggles, all
//! driven by a per-frame tick and requested over an event bus.

pub mod audio_system;
pub mod config;
pub mod error;
pub mod messaging;
pub mod state;

pub use audio_system::{
    Anchor, AudioDirector, Channel, MemoryBackend, PlayRequest, PlaybackBackend, RodioBackend,
    SfxRequest, TrackRef, TrackRegistry, TransitionController,
};
pub use config::EngineConfig;
pub use error::{AppResult, AudioError, ConfigError};
pub use messaging::{AudioEvent, EventBus};
pub use state::{ChannelState, FadeMode};
