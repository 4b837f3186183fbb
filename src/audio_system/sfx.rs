/// Sound-effect trigger
///
/// Fire-and-forget one-shots. Each accepted trigger creates a transient
/// instance that is released automatically once its buffer has played through
/// at the instance's pitch.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::backend::{Anchor, PlaybackBackend, PlaybackHandle, Position};
use super::effects::ReleaseTimer;
use super::registry::TrackCatalog;
use crate::error::AudioError;

/// Parameters of one sound-effect trigger
#[derive(Debug, Clone, PartialEq)]
pub struct SfxRequest {
    /// Candidate names; one is chosen at random per trigger
    pub names: Vec<String>,
    pub volume: f32,
    pub pitch: f32,
    pub randomize_pitch: bool,
    pub pitch_range: f32,
    pub spatial_blend: f32,

    /// Instance follows this anchor; `None` plays fully 2D at the reference position
    pub anchor: Option<Anchor>,

    /// 0-100; below 100 the trigger is gated by a random draw
    pub percent_chance: u8,

    /// Free-form label carried into log lines
    pub tag: String,
}

impl SfxRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            ..Self::default()
        }
    }

    /// Request that picks one of `names` at random each time it fires
    pub fn one_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_pitch(mut self, pitch: f32, randomize: bool, range: f32) -> Self {
        self.pitch = pitch;
        self.randomize_pitch = randomize;
        self.pitch_range = range;
        self
    }

    pub fn with_spatial_blend(mut self, blend: f32) -> Self {
        self.spatial_blend = blend;
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_chance(mut self, percent: u8) -> Self {
        self.percent_chance = percent.min(100);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

impl Default for SfxRequest {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            volume: 1.0,
            pitch: 1.0,
            randomize_pitch: true,
            pitch_range: 0.1,
            spatial_blend: 0.5,
            anchor: None,
            percent_chance: 100,
            tag: String::new(),
        }
    }
}

#[derive(Debug)]
struct LiveEffect {
    handle: PlaybackHandle,
    timer: ReleaseTimer,
}

/// Dispatches sound effects and releases them when they finish
#[derive(Debug)]
pub struct SoundEffectTrigger<R: Rng = StdRng> {
    rng: R,
    home: Position,
    live: Vec<LiveEffect>,
}

impl SoundEffectTrigger<StdRng> {
    pub fn new(home: Position) -> Self {
        Self::with_rng(home, StdRng::from_entropy())
    }
}

impl<R: Rng> SoundEffectTrigger<R> {
    pub fn with_rng(home: Position, rng: R) -> Self {
        Self {
            rng,
            home,
            live: Vec::new(),
        }
    }

    /// Play one sound effect.
    ///
    /// Returns `Ok(None)` when the chance gate skipped the trigger.
    pub fn trigger(
        &mut self,
        backend: &mut dyn PlaybackBackend,
        catalog: &TrackCatalog,
        request: &SfxRequest,
    ) -> Result<Option<PlaybackHandle>, AudioError> {
        if !self.passes_chance(request.percent_chance) {
            tracing::trace!("Sound effect {:?} skipped by chance gate", request.names);
            return Ok(None);
        }

        let name = request
            .names
            .choose(&mut self.rng)
            .ok_or_else(|| AudioError::SfxNotFound(String::new()))?;
        let buffer = catalog
            .find(name)
            .ok_or_else(|| AudioError::SfxNotFound(name.clone()))?;

        let (position, parent, spatial_blend) = match request.anchor {
            Some(anchor) => (anchor.position, Some(anchor.id), request.spatial_blend),
            None => (self.home, None, 0.0),
        };
        let pitch = self.effective_pitch(request);

        let handle = backend.create_instance(buffer, position, parent)?;
        backend.set_volume(handle, request.volume);
        backend.set_pitch(handle, pitch);
        backend.set_spatial_blend(handle, spatial_blend);
        backend.set_looping(handle, false);
        backend.play(handle);

        let timer = ReleaseTimer::for_playback(backend.duration(buffer), pitch);
        tracing::debug!(
            "Sound effect '{}' [{}] playing at pitch {:.3}, releasing in {:.2}s",
            name,
            request.tag,
            pitch,
            timer.remaining()
        );
        self.live.push(LiveEffect { handle, timer });
        Ok(Some(handle))
    }

    /// Count down live instances and release the ones that finished
    pub fn tick(&mut self, backend: &mut dyn PlaybackBackend, dt: f32) {
        self.live.retain_mut(|effect| {
            if effect.timer.advance(dt) {
                backend.release(effect.handle);
                false
            } else {
                true
            }
        });
    }

    /// Number of instances not yet released
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Release every live instance immediately
    pub fn shutdown(&mut self, backend: &mut dyn PlaybackBackend) {
        for effect in self.live.drain(..) {
            backend.stop(effect.handle);
            backend.release(effect.handle);
        }
    }

    /// Draw in `[0, 100)`; a draw equal to the threshold still plays.
    /// A zero chance never plays.
    fn passes_chance(&mut self, percent_chance: u8) -> bool {
        match percent_chance {
            0 => return false,
            100.. => return true,
            _ => {}
        }
        let draw: u8 = self.rng.gen_range(0..100);
        draw <= percent_chance
    }

    /// The randomized draw is multiplied by the base pitch once more, so the
    /// result is centred on `pitch²` rather than `pitch`.
    fn effective_pitch(&mut self, request: &SfxRequest) -> f32 {
        if !request.randomize_pitch {
            return request.pitch;
        }
        let low = request.pitch - request.pitch_range;
        let high = request.pitch + request.pitch_range;
        let draw = if low < high {
            self.rng.gen_range(low..=high)
        } else {
            request.pitch
        };
        draw * request.pitch
    }
}
