/// Audio director
///
/// Owns the backend, the track registry, one transition controller per
/// looping channel and the sound-effect trigger. Producers reach it only
/// through the event bus; the director drains its subscription on every tick
/// and routes each request. Failures are logged and never reported back.
use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::backend::PlaybackBackend;
use super::registry::TrackRegistry;
use super::sfx::SoundEffectTrigger;
use super::source::Channel;
use super::transition::TransitionController;
use crate::config::EngineConfig;
use crate::error::AudioError;
use crate::messaging::{AudioEvent, EventBus, RequestScheduler, SubscriberId};
use crate::state::ChannelState;

/// Audio director
///
/// Single owner of all channel state. Ticked once per frame by the host loop.
pub struct AudioDirector<B: PlaybackBackend> {
    backend: B,
    registry: TrackRegistry,
    music: TransitionController,
    ambient: TransitionController,
    sfx: SoundEffectTrigger<StdRng>,
    scheduler: RequestScheduler,
    rng: StdRng,
    bus: EventBus,
    inbox: Receiver<AudioEvent>,
    subscription: SubscriberId,
}

impl<B: PlaybackBackend> AudioDirector<B> {
    /// Create a director and subscribe it to `bus`
    pub fn new(backend: B, registry: TrackRegistry, config: &EngineConfig, bus: EventBus) -> Self {
        Self::with_rng(backend, registry, config, bus, StdRng::from_entropy())
    }

    /// Same as [`AudioDirector::new`] with a fixed seed for every random draw
    pub fn with_seed(
        backend: B,
        registry: TrackRegistry,
        config: &EngineConfig,
        bus: EventBus,
        seed: u64,
    ) -> Self {
        Self::with_rng(backend, registry, config, bus, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        backend: B,
        registry: TrackRegistry,
        config: &EngineConfig,
        bus: EventBus,
        mut rng: StdRng,
    ) -> Self {
        let home = config.reference_position;
        let sfx_rng = StdRng::from_rng(&mut rng).unwrap_or_else(|_| StdRng::seed_from_u64(0));
        let (inbox, subscription) = bus.subscribe();

        tracing::info!(
            "Audio director ready: {} music, {} ambient, {} sound effect buffers",
            registry.music.len(),
            registry.ambient.len(),
            registry.sfx.len()
        );

        Self {
            backend,
            registry,
            music: TransitionController::new(Channel::Music, config.music, home),
            ambient: TransitionController::new(Channel::Ambient, config.ambient, home),
            sfx: SoundEffectTrigger::with_rng(home, sfx_rng),
            scheduler: RequestScheduler::new(),
            rng,
            bus,
            inbox,
            subscription,
        }
    }

    /// Bus producers publish requests on
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Advance one frame: running fades and sound-effect timers first, then
    /// scheduled requests that became ready, then everything published since
    /// the previous tick.
    pub fn tick(&mut self, dt: f32) {
        self.music.tick(&mut self.backend, dt);
        self.ambient.tick(&mut self.backend, dt);
        self.sfx.tick(&mut self.backend, dt);

        let music = &self.music;
        let ambient = &self.ambient;
        let ready = self.scheduler.tick(dt, |channel| match channel {
            Channel::Music => !music.is_transitioning(),
            Channel::Ambient => !ambient.is_transitioning(),
        });
        for event in ready {
            self.dispatch(event);
        }

        while let Ok(event) = self.inbox.try_recv() {
            self.dispatch(event);
        }
    }

    /// Route one request immediately. Errors are logged, not returned.
    pub fn dispatch(&mut self, event: AudioEvent) {
        let description = event.description();
        match self.handle(event) {
            Ok(()) => tracing::debug!("Handled: {}", description),
            Err(e) if e.is_benign() => tracing::debug!("Ignored '{}': {}", description, e),
            Err(AudioError::TransitionRejected(channel)) => tracing::warn!(
                "Request '{}' dropped, {} channel is {}",
                description,
                channel,
                self.channel_state(channel).phase().description()
            ),
            Err(e) => tracing::warn!("Request '{}' failed: {}", description, e),
        }
    }

    fn handle(&mut self, event: AudioEvent) -> Result<(), AudioError> {
        let Self {
            backend,
            registry,
            music,
            ambient,
            sfx,
            ..
        } = self;

        let Some(channel) = event.channel() else {
            if let AudioEvent::PlaySfx(request) = &event {
                sfx.trigger(backend, &registry.sfx, request)?;
            }
            return Ok(());
        };
        let controller = match channel {
            Channel::Music => music,
            Channel::Ambient => ambient,
        };

        match event {
            AudioEvent::StopMusic { fade_duration } | AudioEvent::StopAmbient { fade_duration } => {
                controller.stop(backend, fade_duration)
            }
            AudioEvent::PauseMusic { fade_duration }
            | AudioEvent::PauseAmbient { fade_duration } => controller.pause(backend, fade_duration),
            play => match play.play_request() {
                Some(request) => controller.play(backend, registry.catalog(channel), request),
                None => Ok(()),
            },
        }
    }

    /// Dispatch `event` once `delay` seconds have passed
    pub fn schedule_after(&mut self, event: AudioEvent, delay: f32) {
        self.scheduler.publish_after(event, delay);
    }

    /// Dispatch `event` after a random delay below `max_delay`
    pub fn schedule_after_random(&mut self, event: AudioEvent, max_delay: f32) {
        self.scheduler
            .publish_after_random(event, max_delay, &mut self.rng);
    }

    /// Dispatch `event` as soon as `channel` has no transition in flight
    pub fn schedule_when_idle(&mut self, event: AudioEvent, channel: Channel) {
        self.scheduler.publish_when_idle(event, channel);
    }

    /// Number of scheduled requests not yet dispatched
    pub fn scheduled_count(&self) -> usize {
        self.scheduler.len()
    }

    pub fn is_transitioning(&self, channel: Channel) -> bool {
        self.controller(channel).is_transitioning()
    }

    pub fn channel_state(&self, channel: Channel) -> &ChannelState {
        self.controller(channel).state()
    }

    pub fn controller(&self, channel: Channel) -> &TransitionController {
        match channel {
            Channel::Music => &self.music,
            Channel::Ambient => &self.ambient,
        }
    }

    /// Number of sound effects still playing
    pub fn live_effects(&self) -> usize {
        self.sfx.live_count()
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Cancel every fade, release every instance and leave the bus
    pub fn shutdown(&mut self) {
        self.music.shutdown(&mut self.backend);
        self.ambient.shutdown(&mut self.backend);
        self.sfx.shutdown(&mut self.backend);
        self.scheduler.clear();
        self.bus.unsubscribe(self.subscription);
        while self.inbox.try_recv().is_ok() {}
        tracing::info!("Audio director shut down");
    }
}
