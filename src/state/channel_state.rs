/// Per-channel transition state
///
/// Snapshot of what a channel is doing: which instance is sounding, which one
/// is being faded in, and the guards that serialize transitions.
use serde::{Deserialize, Serialize};

use crate::audio_system::PlaybackHandle;

/// How a channel moves from one track to the next
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum FadeMode {
    /// Fade the current track out completely, then fade the new one in
    SequentialFade,

    /// Fade the current track out while the new one fades in
    #[default]
    Crossfade,
}

/// Coarse lifecycle phase of a channel
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChannelPhase {
    /// No instance exists
    Idle,

    /// A fade, crossfade or pause fade is running
    Transitioning,

    /// The current instance is paused
    Paused,

    /// The current instance is sounding
    Playing,
}

impl ChannelPhase {
    pub fn description(&self) -> &'static str {
        match self {
            ChannelPhase::Idle => "Idle",
            ChannelPhase::Transitioning => "Transitioning...",
            ChannelPhase::Paused => "Paused",
            ChannelPhase::Playing => "Playing",
        }
    }
}

/// State owned by one transition controller
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelState {
    /// Instance currently considered the channel's track
    pub current_source: Option<PlaybackHandle>,

    /// Instance being faded in; only set during a transition
    pub next_source: Option<PlaybackHandle>,

    pub fade_mode: FadeMode,

    /// Seconds
    pub fade_duration: f32,

    /// Busy flag: while set, Play/Stop/Pause requests are rejected
    pub is_transitioning: bool,

    /// Toggled by every accepted Pause request
    pub is_paused: bool,
}

impl ChannelState {
    pub fn new(fade_mode: FadeMode, fade_duration: f32) -> Self {
        Self {
            current_source: None,
            next_source: None,
            fade_mode,
            fade_duration: fade_duration.max(0.0),
            is_transitioning: false,
            is_paused: false,
        }
    }

    pub fn phase(&self) -> ChannelPhase {
        if self.is_transitioning {
            ChannelPhase::Transitioning
        } else if self.current_source.is_none() {
            ChannelPhase::Idle
        } else if self.is_paused {
            ChannelPhase::Paused
        } else {
            ChannelPhase::Playing
        }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new(FadeMode::Crossfade, 1.5)
    }
}
