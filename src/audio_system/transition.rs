/// Transition controller
///
/// One controller per looping channel. It owns the channel's current and next
/// instances and runs at most one ramp task at a time: a sequential fade, a
/// crossfade, a fade-out-and-stop, or a pause/resume fade. Tasks hold their own
/// progress cursor and are advanced by [`TransitionController::tick`] once per
/// frame.
use std::fmt;

use super::backend::{Anchor, BufferHandle, PlaybackBackend, PlaybackHandle, Position};
use super::effects::{Levels, Ramp};
use super::registry::TrackCatalog;
use super::source::Channel;
use crate::config::ChannelDefaults;
use crate::error::AudioError;
use crate::state::{ChannelState, FadeMode};

/// Volume a resumed channel fades back up to
const RESUME_VOLUME: f32 = 1.0;

/// Reference to a catalog track: a non-empty name wins over the index
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRef {
    pub index: i32,
    pub name: String,
}

impl TrackRef {
    pub fn by_index(index: i32) -> Self {
        Self {
            index,
            name: String::new(),
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            index: -1,
            name: name.into(),
        }
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "#{}", self.index)
        } else {
            write!(f, "'{}'", self.name)
        }
    }
}

/// Parameters of a Play request
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub track: TrackRef,
    pub levels: Levels,
    pub fade_mode: FadeMode,

    /// Seconds
    pub fade_duration: f32,
    pub looping: bool,

    /// Parent for the new instance; `None` plays at the controller's reference position
    pub anchor: Option<Anchor>,
}

impl PlayRequest {
    pub fn new(track: TrackRef) -> Self {
        Self {
            track,
            levels: Levels::unit(),
            fade_mode: FadeMode::Crossfade,
            fade_duration: 1.5,
            looping: true,
            anchor: None,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.levels = self.levels.with_volume(volume);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.levels = self.levels.with_pitch(pitch);
        self
    }

    pub fn with_spatial_blend(mut self, blend: f32) -> Self {
        self.levels = self.levels.with_spatial_blend(blend);
        self
    }

    pub fn with_fade(mut self, mode: FadeMode, duration: f32) -> Self {
        self.fade_mode = mode;
        self.fade_duration = duration;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

/// A track waiting to be instantiated once the outgoing one has faded out
#[derive(Debug, Clone)]
struct Incoming {
    buffer: BufferHandle,
    levels: Levels,
    looping: bool,
    position: Position,
    parent: Option<u64>,
}

#[derive(Debug, Clone)]
enum RampTask {
    /// Outgoing (if any) fades to 0 while the next source fades to target
    Crossfade {
        outgoing_volume: Option<f32>,
        start_pitch: f32,
        start_blend: f32,
        target: Levels,
        ramp: Ramp,
    },

    /// First half of a sequential fade; the new track is created when this ends
    FadeOutThenIn {
        start_volume: f32,
        incoming: Incoming,
        ramp: Ramp,
    },

    /// Second half of a sequential fade
    FadeIn { target: Levels, ramp: Ramp },

    FadeOutStop { start_volume: f32, ramp: Ramp },

    FadeOutPause { start_volume: f32, ramp: Ramp },

    FadeInResume { ramp: Ramp },
}

impl RampTask {
    fn ramp(&self) -> &Ramp {
        match self {
            RampTask::Crossfade { ramp, .. }
            | RampTask::FadeOutThenIn { ramp, .. }
            | RampTask::FadeIn { ramp, .. }
            | RampTask::FadeOutStop { ramp, .. }
            | RampTask::FadeOutPause { ramp, .. }
            | RampTask::FadeInResume { ramp } => ramp,
        }
    }

    fn ramp_mut(&mut self) -> &mut Ramp {
        match self {
            RampTask::Crossfade { ramp, .. }
            | RampTask::FadeOutThenIn { ramp, .. }
            | RampTask::FadeIn { ramp, .. }
            | RampTask::FadeOutStop { ramp, .. }
            | RampTask::FadeOutPause { ramp, .. }
            | RampTask::FadeInResume { ramp } => ramp,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RampTask::Crossfade { .. } => "crossfade",
            RampTask::FadeOutThenIn { .. } => "fade out",
            RampTask::FadeIn { .. } => "fade in",
            RampTask::FadeOutStop { .. } => "stop fade",
            RampTask::FadeOutPause { .. } => "pause fade",
            RampTask::FadeInResume { .. } => "resume fade",
        }
    }
}

/// Serializes transitions on one channel
#[derive(Debug)]
pub struct TransitionController {
    channel: Channel,
    home: Position,
    state: ChannelState,
    task: Option<RampTask>,
}

impl TransitionController {
    /// Create a controller whose unanchored instances are placed at `home`
    pub fn new(channel: Channel, defaults: ChannelDefaults, home: Position) -> Self {
        Self {
            channel,
            home,
            state: ChannelState::new(defaults.fade_mode, defaults.fade_duration),
            task: None,
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.is_transitioning
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused
    }

    pub fn current_source(&self) -> Option<PlaybackHandle> {
        self.state.current_source
    }

    /// Start a transition to the requested track.
    ///
    /// Rejected while another transition is in flight or when the track does
    /// not resolve; neither case changes any state.
    pub fn play(
        &mut self,
        backend: &mut dyn PlaybackBackend,
        catalog: &TrackCatalog,
        request: PlayRequest,
    ) -> Result<(), AudioError> {
        if self.state.is_transitioning {
            return Err(AudioError::TransitionRejected(self.channel));
        }
        let buffer = catalog.resolve(request.track.index, &request.track.name)?;
        let fade_duration = Ramp::new(request.fade_duration).duration();

        // A current instance that is no longer audible (paused or finished)
        // is dropped once the new track is under way
        let (outgoing, stale) = match self.state.current_source {
            Some(handle) if backend.is_playing(handle) => (Some(handle), None),
            current => (None, current),
        };
        let incoming = Incoming {
            buffer,
            levels: request.levels,
            looping: request.looping,
            position: request.anchor.map(|a| a.position).unwrap_or(self.home),
            parent: request.anchor.map(|a| a.id),
        };
        let ramp = Ramp::new(fade_duration);

        let task = match (request.fade_mode, outgoing) {
            (FadeMode::SequentialFade, Some(handle)) => RampTask::FadeOutThenIn {
                start_volume: backend.volume(handle),
                incoming,
                ramp,
            },
            (FadeMode::SequentialFade, None) => {
                self.spawn(backend, &incoming, 0.0, 0.0)?;
                RampTask::FadeIn {
                    target: incoming.levels,
                    ramp,
                }
            }
            (FadeMode::Crossfade, outgoing) => {
                let target = incoming.levels;
                let (start_pitch, start_blend) = match outgoing {
                    Some(handle) => (backend.pitch(handle), backend.spatial_blend(handle)),
                    None => (target.pitch(), target.spatial_blend()),
                };
                self.spawn(backend, &incoming, target.pitch(), target.spatial_blend())?;
                RampTask::Crossfade {
                    outgoing_volume: outgoing.map(|handle| backend.volume(handle)),
                    start_pitch,
                    start_blend,
                    target,
                    ramp,
                }
            }
        };

        if let Some(handle) = stale {
            backend.stop(handle);
            backend.release(handle);
            self.state.current_source = None;
        }
        self.state.fade_mode = request.fade_mode;
        self.state.fade_duration = fade_duration;

        tracing::info!(
            "{}: {:?} to track {} over {:.2}s",
            self.channel,
            request.fade_mode,
            request.track,
            self.state.fade_duration
        );
        self.begin(backend, task);
        Ok(())
    }

    /// Fade the current track out, then stop and release it.
    pub fn stop(
        &mut self,
        backend: &mut dyn PlaybackBackend,
        fade_duration: f32,
    ) -> Result<(), AudioError> {
        if self.state.is_transitioning {
            return Err(AudioError::TransitionRejected(self.channel));
        }
        let handle = match self.state.current_source {
            Some(handle) if backend.is_playing(handle) => handle,
            _ => return Err(AudioError::NothingPlaying(self.channel)),
        };

        self.state.fade_duration = Ramp::new(fade_duration).duration();
        tracing::info!(
            "{}: stopping over {:.2}s",
            self.channel,
            self.state.fade_duration
        );
        let task = RampTask::FadeOutStop {
            start_volume: backend.volume(handle),
            ramp: Ramp::new(self.state.fade_duration),
        };
        self.begin(backend, task);
        Ok(())
    }

    /// Toggle pause. Pausing fades to silence before pausing the instance;
    /// resuming unpauses first and fades back up to full volume.
    pub fn pause(
        &mut self,
        backend: &mut dyn PlaybackBackend,
        fade_duration: f32,
    ) -> Result<(), AudioError> {
        if self.state.is_transitioning {
            return Err(AudioError::TransitionRejected(self.channel));
        }
        let handle = self
            .state
            .current_source
            .ok_or(AudioError::NothingPlaying(self.channel))?;

        self.state.fade_duration = Ramp::new(fade_duration).duration();
        let ramp = Ramp::new(self.state.fade_duration);

        let task = if self.state.is_paused {
            tracing::info!("{}: resuming", self.channel);
            backend.resume(handle);
            RampTask::FadeInResume { ramp }
        } else {
            tracing::info!("{}: pausing", self.channel);
            RampTask::FadeOutPause {
                start_volume: backend.volume(handle),
                ramp,
            }
        };
        self.state.is_paused = !self.state.is_paused;
        self.begin(backend, task);
        Ok(())
    }

    /// Advance the in-flight task by one frame of `dt` seconds
    pub fn tick(&mut self, backend: &mut dyn PlaybackBackend, dt: f32) {
        let Some(mut task) = self.task.take() else {
            return;
        };

        task.ramp_mut().advance(dt);
        if task.ramp().is_running() {
            self.apply(backend, &task);
            self.task = Some(task);
        } else {
            self.finish(backend, task);
        }
    }

    /// Abort the in-flight task, releasing any instance it created
    pub fn cancel(&mut self, backend: &mut dyn PlaybackBackend) {
        if let Some(task) = self.task.take() {
            tracing::debug!("{}: cancelled {}", self.channel, task.name());
        }
        if let Some(handle) = self.state.next_source.take() {
            backend.stop(handle);
            backend.release(handle);
        }
        self.state.is_transitioning = false;
    }

    /// Cancel any task and release the current instance
    pub fn shutdown(&mut self, backend: &mut dyn PlaybackBackend) {
        self.cancel(backend);
        if let Some(handle) = self.state.current_source.take() {
            backend.stop(handle);
            backend.release(handle);
        }
        self.state.is_paused = false;
    }

    fn spawn(
        &mut self,
        backend: &mut dyn PlaybackBackend,
        incoming: &Incoming,
        pitch: f32,
        blend: f32,
    ) -> Result<PlaybackHandle, AudioError> {
        let handle = backend.create_instance(incoming.buffer, incoming.position, incoming.parent)?;
        backend.set_volume(handle, 0.0);
        if self.channel.ramps_pitch_and_blend() {
            backend.set_pitch(handle, pitch);
            backend.set_spatial_blend(handle, blend);
        }
        backend.set_looping(handle, incoming.looping);
        backend.play(handle);

        tracing::debug!("{}: created instance {}", self.channel, handle.id());
        self.state.next_source = Some(handle);
        Ok(handle)
    }

    fn begin(&mut self, backend: &mut dyn PlaybackBackend, task: RampTask) {
        self.state.is_transitioning = true;
        self.apply(backend, &task);
        self.task = Some(task);
    }

    /// Write the values sampled at the task's current cursor
    fn apply(&self, backend: &mut dyn PlaybackBackend, task: &RampTask) {
        let ramps_pitch = self.channel.ramps_pitch_and_blend();
        match task {
            RampTask::Crossfade {
                outgoing_volume,
                start_pitch,
                start_blend,
                target,
                ramp,
            } => {
                if let (Some(from), Some(old)) = (outgoing_volume, self.state.current_source) {
                    backend.set_volume(old, ramp.sample(*from, 0.0));
                }
                if let Some(new) = self.state.next_source {
                    backend.set_volume(new, ramp.sample(0.0, target.volume()));
                    if ramps_pitch {
                        backend.set_pitch(new, ramp.sample(*start_pitch, target.pitch()));
                        backend.set_spatial_blend(
                            new,
                            ramp.sample(*start_blend, target.spatial_blend()),
                        );
                    }
                }
            }
            RampTask::FadeOutThenIn {
                start_volume, ramp, ..
            }
            | RampTask::FadeOutStop { start_volume, ramp }
            | RampTask::FadeOutPause { start_volume, ramp } => {
                if let Some(old) = self.state.current_source {
                    backend.set_volume(old, ramp.sample(*start_volume, 0.0));
                }
            }
            RampTask::FadeIn { target, ramp } => {
                if let Some(new) = self.state.next_source {
                    backend.set_volume(new, ramp.sample(0.0, target.volume()));
                    if ramps_pitch {
                        backend.set_pitch(new, ramp.sample(0.0, target.pitch()));
                        backend.set_spatial_blend(new, ramp.sample(0.0, target.spatial_blend()));
                    }
                }
            }
            RampTask::FadeInResume { ramp } => {
                if let Some(current) = self.state.current_source {
                    backend.set_volume(current, ramp.sample(0.0, RESUME_VOLUME));
                }
            }
        }
    }

    fn finish(&mut self, backend: &mut dyn PlaybackBackend, task: RampTask) {
        match task {
            RampTask::Crossfade {
                outgoing_volume,
                target,
                ..
            } => {
                if outgoing_volume.is_some() {
                    if let Some(old) = self.state.current_source.take() {
                        backend.release(old);
                    }
                }
                self.promote(backend, target);
            }
            RampTask::FadeOutThenIn { incoming, .. } => {
                if let Some(old) = self.state.current_source.take() {
                    backend.stop(old);
                    backend.release(old);
                }
                match self.spawn(backend, &incoming, 0.0, 0.0) {
                    Ok(_) => {
                        let task = RampTask::FadeIn {
                            target: incoming.levels,
                            ramp: Ramp::new(self.state.fade_duration),
                        };
                        self.begin(backend, task);
                    }
                    Err(e) => {
                        tracing::warn!("{}: could not start next track: {}", self.channel, e);
                        self.state.is_paused = false;
                        self.state.is_transitioning = false;
                    }
                }
            }
            RampTask::FadeIn { target, .. } => self.promote(backend, target),
            RampTask::FadeOutStop { .. } => {
                if let Some(old) = self.state.current_source.take() {
                    backend.stop(old);
                    backend.release(old);
                }
                self.state.is_paused = false;
                self.state.is_transitioning = false;
                tracing::info!("{}: stopped", self.channel);
            }
            RampTask::FadeOutPause { .. } => {
                if let Some(current) = self.state.current_source {
                    backend.set_volume(current, 0.0);
                    backend.pause(current);
                }
                self.state.is_transitioning = false;
            }
            RampTask::FadeInResume { .. } => {
                if let Some(current) = self.state.current_source {
                    backend.set_volume(current, RESUME_VOLUME);
                }
                self.state.is_transitioning = false;
            }
        }
    }

    /// Make the faded-in instance current at its final levels
    fn promote(&mut self, backend: &mut dyn PlaybackBackend, target: Levels) {
        if let Some(new) = self.state.next_source.take() {
            backend.set_volume(new, target.volume());
            if self.channel.ramps_pitch_and_blend() {
                backend.set_pitch(new, target.pitch());
                backend.set_spatial_blend(new, target.spatial_blend());
            }
            self.state.current_source = Some(new);
        }
        self.state.is_paused = false;
        self.state.is_transitioning = false;
        tracing::info!("{}: transition complete", self.channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::memory::{MemoryBackend, VoiceStatus};

    const HOME: Position = [0.0, 1.0, 0.0];

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    fn fixture(channel: Channel) -> (MemoryBackend, TrackCatalog, TransitionController) {
        let mut backend = MemoryBackend::new();
        let a = backend.add_buffer("Audio/BGM", "A", 30.0);
        let b = backend.add_buffer("Audio/BGM", "B", 45.0);
        let catalog =
            TrackCatalog::from_entries("music", vec![("A".to_string(), a), ("B".to_string(), b)]);
        let controller = TransitionController::new(channel, ChannelDefaults::default(), HOME);
        (backend, catalog, controller)
    }

    /// Put track A on the channel at `volume` with an instant transition
    fn start_a(
        backend: &mut MemoryBackend,
        catalog: &TrackCatalog,
        controller: &mut TransitionController,
        volume: f32,
    ) -> PlaybackHandle {
        let request = PlayRequest::new(TrackRef::by_index(0))
            .with_volume(volume)
            .with_fade(FadeMode::Crossfade, 0.0);
        controller.play(backend, catalog, request).unwrap();
        controller.tick(backend, 0.016);
        assert!(!controller.is_transitioning());
        controller.current_source().unwrap()
    }

    #[test]
    fn test_crossfade_from_silence_ramps_new_source() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let request = PlayRequest::new(TrackRef::by_index(0))
            .with_volume(0.8)
            .with_fade(FadeMode::Crossfade, 2.0);
        controller.play(&mut backend, &catalog, request).unwrap();

        let next = controller.state().next_source.unwrap();
        assert_eq!(backend.volume(next), 0.0);
        assert!(backend.is_playing(next));
        assert!(controller.is_transitioning());

        for expected in [0.2, 0.4, 0.6] {
            controller.tick(&mut backend, 0.5);
            assert!(controller.is_transitioning());
            assert_close(backend.volume(next), expected);
        }

        controller.tick(&mut backend, 0.5);
        assert!(!controller.is_transitioning());
        assert_eq!(controller.current_source(), Some(next));
        assert_close(backend.volume(next), 0.8);
        assert_eq!(backend.stats().released, 0);
    }

    #[test]
    fn test_crossfade_between_tracks() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let old = start_a(&mut backend, &catalog, &mut controller, 0.8);

        let request = PlayRequest::new(TrackRef::by_index(1))
            .with_volume(0.5)
            .with_fade(FadeMode::Crossfade, 1.0);
        controller.play(&mut backend, &catalog, request).unwrap();
        let new = controller.state().next_source.unwrap();

        controller.tick(&mut backend, 0.5);
        assert_close(backend.volume(old), 0.4);
        assert_close(backend.volume(new), 0.25);

        controller.tick(&mut backend, 0.5);
        assert!(!controller.is_transitioning());
        assert!(backend.voice(old).is_none());
        assert_eq!(controller.current_source(), Some(new));
        assert_close(backend.volume(new), 0.5);
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn test_crossfade_total_volume_is_monotonic() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let old = start_a(&mut backend, &catalog, &mut controller, 0.8);

        let request = PlayRequest::new(TrackRef::by_name("B"))
            .with_volume(0.5)
            .with_fade(FadeMode::Crossfade, 1.0);
        controller.play(&mut backend, &catalog, request).unwrap();
        let new = controller.state().next_source.unwrap();

        let mut previous = backend.volume(old) + backend.volume(new);
        assert_close(previous, 0.8);
        while controller.is_transitioning() {
            controller.tick(&mut backend, 0.125);
            let total = backend.volume(old) + backend.volume(new);
            assert!(total <= previous + 1e-5, "total rose from {previous} to {total}");
            previous = total;
        }
        assert_close(previous, 0.5);
        assert!(backend.voice(old).is_none());
    }

    #[test]
    fn test_requests_rejected_while_transitioning() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let request = PlayRequest::new(TrackRef::by_index(0)).with_fade(FadeMode::Crossfade, 1.0);
        controller.play(&mut backend, &catalog, request.clone()).unwrap();

        assert_eq!(
            controller.play(&mut backend, &catalog, request),
            Err(AudioError::TransitionRejected(Channel::Music))
        );
        assert!(controller.stop(&mut backend, 1.0).is_err());
        assert!(controller.pause(&mut backend, 1.0).is_err());
        assert_eq!(backend.stats().created, 1);
        assert!(!controller.is_paused());
    }

    #[test]
    fn test_sequential_fade_out_then_in() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let old = start_a(&mut backend, &catalog, &mut controller, 1.0);

        let request = PlayRequest::new(TrackRef::by_index(1))
            .with_volume(0.5)
            .with_fade(FadeMode::SequentialFade, 1.0);
        controller.play(&mut backend, &catalog, request).unwrap();
        assert!(controller.state().next_source.is_none());

        controller.tick(&mut backend, 0.5);
        assert_close(backend.volume(old), 0.5);
        assert_eq!(backend.live_count(), 1);

        controller.tick(&mut backend, 0.5);
        assert!(backend.voice(old).is_none());
        let new = controller.state().next_source.unwrap();
        assert_eq!(backend.volume(new), 0.0);
        assert!(controller.is_transitioning());

        controller.tick(&mut backend, 0.5);
        assert_close(backend.volume(new), 0.25);

        controller.tick(&mut backend, 0.5);
        assert!(!controller.is_transitioning());
        assert_eq!(controller.current_source(), Some(new));
        assert_close(backend.volume(new), 0.5);
    }

    #[test]
    fn test_ambient_sequential_fade_in_ramps_pitch_and_blend() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Ambient);
        let request = PlayRequest::new(TrackRef::by_index(0))
            .with_volume(1.0)
            .with_pitch(1.2)
            .with_spatial_blend(0.6)
            .with_fade(FadeMode::SequentialFade, 1.0);
        controller.play(&mut backend, &catalog, request).unwrap();

        let new = controller.state().next_source.unwrap();
        assert_eq!(backend.pitch(new), 0.0);
        assert_eq!(backend.spatial_blend(new), 0.0);

        controller.tick(&mut backend, 0.5);
        assert_close(backend.pitch(new), 0.6);
        assert_close(backend.spatial_blend(new), 0.3);

        controller.tick(&mut backend, 0.5);
        assert_close(backend.pitch(new), 1.2);
        assert_close(backend.spatial_blend(new), 0.6);
    }

    #[test]
    fn test_ambient_crossfade_ramps_from_old_pitch() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Ambient);
        start_a(&mut backend, &catalog, &mut controller, 1.0);

        let request = PlayRequest::new(TrackRef::by_index(1))
            .with_pitch(2.0)
            .with_spatial_blend(1.0)
            .with_fade(FadeMode::Crossfade, 1.0);
        controller.play(&mut backend, &catalog, request).unwrap();
        let new = controller.state().next_source.unwrap();

        controller.tick(&mut backend, 0.5);
        assert_close(backend.pitch(new), 1.5);
        assert_close(backend.spatial_blend(new), 0.5);
    }

    #[test]
    fn test_music_leaves_pitch_untouched() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let request = PlayRequest::new(TrackRef::by_index(0))
            .with_pitch(1.7)
            .with_fade(FadeMode::SequentialFade, 0.5);
        controller.play(&mut backend, &catalog, request).unwrap();
        let new = controller.state().next_source.unwrap();
        assert_eq!(backend.pitch(new), 1.0);
    }

    #[test]
    fn test_anchor_sets_position_and_parent() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Ambient);
        let anchor = Anchor::new(42, [5.0, 0.0, -3.0]);
        let request = PlayRequest::new(TrackRef::by_index(0)).with_anchor(anchor);
        controller.play(&mut backend, &catalog, request).unwrap();

        let voice = backend.voice(controller.state().next_source.unwrap()).unwrap();
        assert_eq!(voice.position, [5.0, 0.0, -3.0]);
        assert_eq!(voice.parent, Some(42));
        assert!(voice.looping);
    }

    #[test]
    fn test_unanchored_instance_plays_at_home() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let request = PlayRequest::new(TrackRef::by_index(0)).with_looping(false);
        controller.play(&mut backend, &catalog, request).unwrap();

        let voice = backend.voice(controller.state().next_source.unwrap()).unwrap();
        assert_eq!(voice.position, HOME);
        assert_eq!(voice.parent, None);
        assert!(!voice.looping);
    }

    #[test]
    fn test_stop_without_source_is_noop() {
        let (mut backend, _catalog, mut controller) = fixture(Channel::Music);
        let before = controller.state().clone();

        assert_eq!(
            controller.stop(&mut backend, 1.0),
            Err(AudioError::NothingPlaying(Channel::Music))
        );
        assert_eq!(controller.state(), &before);
        assert_eq!(backend.stats().created, 0);
    }

    #[test]
    fn test_stop_fades_and_releases() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let current = start_a(&mut backend, &catalog, &mut controller, 0.8);

        controller.stop(&mut backend, 1.0).unwrap();
        assert!(controller.is_transitioning());
        controller.tick(&mut backend, 0.5);
        assert_close(backend.volume(current), 0.4);

        controller.tick(&mut backend, 0.5);
        assert!(!controller.is_transitioning());
        assert_eq!(controller.current_source(), None);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_pause_twice_restores_playback() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let current = start_a(&mut backend, &catalog, &mut controller, 1.0);

        controller.pause(&mut backend, 0.5).unwrap();
        assert!(controller.is_paused());
        controller.tick(&mut backend, 0.25);
        assert_close(backend.volume(current), 0.5);
        controller.tick(&mut backend, 0.25);
        assert!(!controller.is_transitioning());
        assert_eq!(backend.voice(current).unwrap().status, VoiceStatus::Paused);

        controller.pause(&mut backend, 0.5).unwrap();
        assert!(!controller.is_paused());
        assert!(backend.is_playing(current));
        assert_eq!(backend.volume(current), 0.0);
        controller.tick(&mut backend, 0.25);
        controller.tick(&mut backend, 0.25);

        assert!(!controller.is_transitioning());
        assert_close(backend.volume(current), 1.0);
        assert_eq!(controller.current_source(), Some(current));
    }

    #[test]
    fn test_pause_without_source() {
        let (mut backend, _catalog, mut controller) = fixture(Channel::Ambient);
        assert!(controller.pause(&mut backend, 1.0).unwrap_err().is_benign());
        assert!(!controller.is_paused());
    }

    #[test]
    fn test_unresolved_track_rejected() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let result = controller.play(&mut backend, &catalog, PlayRequest::new(TrackRef::by_name("Nope")));
        assert!(matches!(result, Err(AudioError::TrackNotFound { .. })));
        assert!(!controller.is_transitioning());
        assert_eq!(backend.stats().created, 0);
    }

    #[test]
    fn test_zero_duration_resolves_in_one_tick() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let request = PlayRequest::new(TrackRef::by_index(1))
            .with_volume(0.7)
            .with_fade(FadeMode::SequentialFade, 0.0);
        controller.play(&mut backend, &catalog, request).unwrap();
        assert!(controller.is_transitioning());

        controller.tick(&mut backend, 0.016);
        assert!(!controller.is_transitioning());
        assert_close(backend.volume(controller.current_source().unwrap()), 0.7);
    }

    #[test]
    fn test_play_over_paused_track_releases_it() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let old = start_a(&mut backend, &catalog, &mut controller, 1.0);
        controller.pause(&mut backend, 0.0).unwrap();
        controller.tick(&mut backend, 0.016);

        let request = PlayRequest::new(TrackRef::by_index(1)).with_fade(FadeMode::Crossfade, 0.0);
        controller.play(&mut backend, &catalog, request).unwrap();
        controller.tick(&mut backend, 0.016);

        assert!(backend.voice(old).is_none());
        assert_eq!(backend.live_count(), 1);
        assert!(!controller.is_paused());
    }

    #[test]
    fn test_failed_spawn_leaves_channel_untouched() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        let old = start_a(&mut backend, &catalog, &mut controller, 1.0);
        controller.pause(&mut backend, 0.0).unwrap();
        controller.tick(&mut backend, 0.016);
        let before = controller.state().clone();

        // Listed in the catalog but never loaded into the backend
        let missing = TrackCatalog::from_entries(
            "music",
            vec![("Lost".to_string(), BufferHandle::new(99))],
        );
        let request = PlayRequest::new(TrackRef::by_index(0)).with_fade(FadeMode::SequentialFade, 3.0);
        let result = controller.play(&mut backend, &missing, request);

        assert!(matches!(result, Err(AudioError::Backend(_))));
        assert_eq!(controller.state(), &before);
        assert_eq!(backend.voice(old).unwrap().status, VoiceStatus::Paused);
        assert_eq!(backend.live_count(), 1);
        assert_eq!(backend.stats().released, 0);
    }

    #[test]
    fn test_cancel_and_shutdown_release_everything() {
        let (mut backend, catalog, mut controller) = fixture(Channel::Music);
        start_a(&mut backend, &catalog, &mut controller, 1.0);
        let request = PlayRequest::new(TrackRef::by_index(1)).with_fade(FadeMode::Crossfade, 2.0);
        controller.play(&mut backend, &catalog, request).unwrap();
        assert_eq!(backend.live_count(), 2);

        controller.cancel(&mut backend);
        assert!(!controller.is_transitioning());
        assert_eq!(backend.live_count(), 1);

        controller.shutdown(&mut backend);
        assert_eq!(backend.live_count(), 0);
        assert_eq!(controller.current_source(), None);
    }
}
