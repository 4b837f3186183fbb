/// Deferred audio requests
///
/// Holds events that should not be dispatched yet: either until a delay has
/// elapsed or until a channel has finished its current transition. The
/// director ticks the scheduler once per frame and dispatches whatever it
/// hands back.
use rand::Rng;

use super::events::AudioEvent;
use crate::audio_system::Channel;

/// What a pending event is waiting for
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gate {
    /// Seconds left before release
    Delay(f32),
    /// Released on the first tick the channel is idle
    WhenIdle(Channel),
}

#[derive(Debug, Clone)]
struct Pending {
    event: AudioEvent,
    gate: Gate,
}

/// Queue of events waiting on a delay or an idle channel
#[derive(Debug, Default)]
pub struct RequestScheduler {
    pending: Vec<Pending>,
}

impl RequestScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release `event` once `delay` seconds of ticks have passed
    pub fn publish_after(&mut self, event: AudioEvent, delay: f32) {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        tracing::debug!("Scheduling '{}' in {:.2}s", event.description(), delay);
        self.pending.push(Pending {
            event,
            gate: Gate::Delay(delay),
        });
    }

    /// Release `event` after a delay drawn uniformly from `[0, max_delay)`
    pub fn publish_after_random<R: Rng + ?Sized>(
        &mut self,
        event: AudioEvent,
        max_delay: f32,
        rng: &mut R,
    ) {
        let delay = if max_delay.is_finite() && max_delay > 0.0 {
            rng.gen_range(0.0..max_delay)
        } else {
            0.0
        };
        self.publish_after(event, delay);
    }

    /// Release `event` on the first tick where `channel` is not transitioning
    pub fn publish_when_idle(&mut self, event: AudioEvent, channel: Channel) {
        tracing::debug!(
            "Holding '{}' until {} is idle",
            event.description(),
            channel
        );
        self.pending.push(Pending {
            event,
            gate: Gate::WhenIdle(channel),
        });
    }

    /// Advance delays by `dt` and return the events now ready, in the order
    /// they were scheduled. `idle` reports whether a channel can take a request.
    ///
    /// At most one idle-gated event is released per channel per tick: the
    /// first one starts a transition, so the rest keep waiting for it to end.
    pub fn tick<F>(&mut self, dt: f32, idle: F) -> Vec<AudioEvent>
    where
        F: Fn(Channel) -> bool,
    {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut ready = Vec::new();
        let mut claimed: Vec<Channel> = Vec::new();

        self.pending.retain_mut(|pending| {
            let release = match &mut pending.gate {
                Gate::Delay(remaining) => {
                    *remaining -= dt;
                    *remaining <= 0.0
                }
                Gate::WhenIdle(channel) => {
                    let free = !claimed.contains(channel) && idle(*channel);
                    if free {
                        claimed.push(*channel);
                    }
                    free
                }
            };
            if release {
                ready.push(pending.event.clone());
            }
            !release
        });

        ready
    }

    /// Number of events still waiting
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every waiting event
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!("Dropping {} scheduled requests", self.pending.len());
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stop_music() -> AudioEvent {
        AudioEvent::StopMusic { fade_duration: 1.0 }
    }

    #[test]
    fn test_delay_elapses_across_ticks() {
        let mut scheduler = RequestScheduler::new();
        scheduler.publish_after(stop_music(), 1.0);

        assert!(scheduler.tick(0.4, |_| true).is_empty());
        assert!(scheduler.tick(0.4, |_| true).is_empty());
        let ready = scheduler.tick(0.4, |_| true);
        assert_eq!(ready, vec![stop_music()]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_zero_delay_released_on_next_tick() {
        let mut scheduler = RequestScheduler::new();
        scheduler.publish_after(stop_music(), 0.0);
        scheduler.publish_after(AudioEvent::PauseMusic { fade_duration: 0.5 }, -3.0);

        let ready = scheduler.tick(0.0, |_| true);
        assert_eq!(ready.len(), 2);
        assert_eq!(ready[0], stop_music());
    }

    #[test]
    fn test_random_delay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut scheduler = RequestScheduler::new();
        for _ in 0..50 {
            scheduler.publish_after_random(stop_music(), 2.0, &mut rng);
        }

        assert_eq!(scheduler.len(), 50);
        // Every delay is below the maximum
        assert_eq!(scheduler.tick(2.0, |_| true).len(), 50);
    }

    #[test]
    fn test_when_idle_waits_for_channel() {
        let mut scheduler = RequestScheduler::new();
        scheduler.publish_when_idle(stop_music(), Channel::Music);

        let busy = |channel: Channel| channel != Channel::Music;
        assert!(scheduler.tick(0.1, busy).is_empty());
        assert!(scheduler.tick(0.1, busy).is_empty());
        assert_eq!(scheduler.len(), 1);

        assert_eq!(scheduler.tick(0.1, |_| true), vec![stop_music()]);
    }

    #[test]
    fn test_channels_gate_independently() {
        let mut scheduler = RequestScheduler::new();
        scheduler.publish_when_idle(stop_music(), Channel::Music);
        scheduler.publish_when_idle(AudioEvent::StopAmbient { fade_duration: 1.0 }, Channel::Ambient);

        let ready = scheduler.tick(0.1, |channel| channel == Channel::Ambient);
        assert_eq!(ready, vec![AudioEvent::StopAmbient { fade_duration: 1.0 }]);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_one_idle_release_per_channel_per_tick() {
        let mut scheduler = RequestScheduler::new();
        let pause_music = AudioEvent::PauseMusic { fade_duration: 0.5 };
        scheduler.publish_when_idle(pause_music.clone(), Channel::Music);
        scheduler.publish_when_idle(stop_music(), Channel::Music);
        scheduler.publish_when_idle(AudioEvent::StopAmbient { fade_duration: 1.0 }, Channel::Ambient);

        let ready = scheduler.tick(0.1, |_| true);
        assert_eq!(
            ready,
            vec![pause_music, AudioEvent::StopAmbient { fade_duration: 1.0 }]
        );
        assert_eq!(scheduler.len(), 1);

        // Still held while the channel is busy with the first request
        assert!(scheduler.tick(0.1, |_| false).is_empty());
        assert_eq!(scheduler.tick(0.1, |_| true), vec![stop_music()]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut scheduler = RequestScheduler::new();
        scheduler.publish_after(stop_music(), 5.0);
        scheduler.publish_when_idle(stop_music(), Channel::Ambient);
        scheduler.clear();
        assert!(scheduler.is_empty());
    }
}
