/// Audio request events
///
/// Signals raised by producers (trigger volumes, scripted sequences, test
/// harnesses) and routed by the director to the owning channel or to the
/// sound-effect trigger. Producers get no reply; outcomes are only logged.
use crate::audio_system::{Anchor, Channel, PlayRequest, SfxRequest, TrackRef};
use crate::state::FadeMode;

/// Audio requests carried on the event bus
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    /// Start (or cross over to) a music track
    PlayMusic {
        index: i32,
        name: String,
        volume: f32,
        fade_mode: FadeMode,
        fade_duration: f32,
        looping: bool,
        tag: String,
    },

    /// Fade music out and release it
    StopMusic { fade_duration: f32 },

    /// Toggle music pause with a fade
    PauseMusic { fade_duration: f32 },

    /// Start (or cross over to) an ambient track
    PlayAmbient {
        anchor: Option<Anchor>,
        index: i32,
        name: String,
        volume: f32,
        pitch: f32,
        spatial_blend: f32,
        fade_mode: FadeMode,
        fade_duration: f32,
        looping: bool,
        tag: String,
    },

    /// Fade ambient audio out and release it
    StopAmbient { fade_duration: f32 },

    /// Toggle ambient pause with a fade
    PauseAmbient { fade_duration: f32 },

    /// Fire a one-shot sound effect
    PlaySfx(SfxRequest),
}

impl AudioEvent {
    /// Channel the event targets; sound effects have none
    pub fn channel(&self) -> Option<Channel> {
        match self {
            AudioEvent::PlayMusic { .. }
            | AudioEvent::StopMusic { .. }
            | AudioEvent::PauseMusic { .. } => Some(Channel::Music),
            AudioEvent::PlayAmbient { .. }
            | AudioEvent::StopAmbient { .. }
            | AudioEvent::PauseAmbient { .. } => Some(Channel::Ambient),
            AudioEvent::PlaySfx(_) => None,
        }
    }

    /// Play request for `PlayMusic`/`PlayAmbient`
    pub fn play_request(&self) -> Option<PlayRequest> {
        match self {
            AudioEvent::PlayMusic {
                index,
                name,
                volume,
                fade_mode,
                fade_duration,
                looping,
                ..
            } => Some(
                PlayRequest::new(track_ref(*index, name))
                    .with_volume(*volume)
                    .with_fade(*fade_mode, *fade_duration)
                    .with_looping(*looping),
            ),
            AudioEvent::PlayAmbient {
                anchor,
                index,
                name,
                volume,
                pitch,
                spatial_blend,
                fade_mode,
                fade_duration,
                looping,
                ..
            } => {
                let request = PlayRequest::new(track_ref(*index, name))
                    .with_volume(*volume)
                    .with_pitch(*pitch)
                    .with_spatial_blend(*spatial_blend)
                    .with_fade(*fade_mode, *fade_duration)
                    .with_looping(*looping);
                Some(match anchor {
                    Some(anchor) => request.with_anchor(*anchor),
                    None => request,
                })
            }
            _ => None,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            AudioEvent::PlayMusic {
                index, name, tag, ..
            } => format!("Play music {} [{}]", track_ref(*index, name), tag),
            AudioEvent::StopMusic { fade_duration } => {
                format!("Stop music over {:.2}s", fade_duration)
            }
            AudioEvent::PauseMusic { .. } => "Toggle music pause".to_string(),
            AudioEvent::PlayAmbient {
                index, name, tag, ..
            } => format!("Play ambient {} [{}]", track_ref(*index, name), tag),
            AudioEvent::StopAmbient { fade_duration } => {
                format!("Stop ambient over {:.2}s", fade_duration)
            }
            AudioEvent::PauseAmbient { .. } => "Toggle ambient pause".to_string(),
            AudioEvent::PlaySfx(request) => {
                format!("Play sound effect {:?} [{}]", request.names, request.tag)
            }
        }
    }
}

fn track_ref(index: i32, name: &str) -> TrackRef {
    TrackRef {
        index,
        name: name.to_string(),
    }
}
