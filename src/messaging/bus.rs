/// Event bus for audio requests
///
/// Producers publish from any thread; every subscriber gets its own unbounded
/// channel and drains it on its own schedule. Clones share the subscriber
/// list. Subscribers whose receiver was dropped are pruned on the next publish.
use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::events::AudioEvent;

/// Subscriber ID for tracking subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

struct Subscriber {
    id: SubscriberId,
    sender: Sender<AudioEvent>,
}

/// Shared list of request subscribers
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<Subscriber>>>,
    next_id: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to requests, returns a receiver and subscription ID
    pub fn subscribe(&self) -> (Receiver<AudioEvent>, SubscriberId) {
        let (tx, rx) = unbounded();
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.subscribers.write().push(Subscriber { id, sender: tx });
        (rx, id)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().retain(|s| s.id != id);
    }

    /// Deliver a request to every live subscriber, in subscription order
    pub fn publish(&self, event: AudioEvent) {
        tracing::trace!("Publishing: {}", event.description());

        self.subscribers
            .write()
            .retain(|subscriber| match subscriber.sender.try_send(event.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => {
                    tracing::debug!(
                        "Dropping subscriber {:?}: receiver is gone",
                        subscriber.id
                    );
                    false
                }
            });
    }

    /// Number of subscribers still registered
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::SfxRequest;

    #[test]
    fn test_event_bus_subscribe() {
        let bus = EventBus::new();
        let (_rx, _id) = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_bus_unsubscribe() {
        let bus = EventBus::new();
        let (_rx, id) = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.unsubscribe(id);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_publish() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();

        bus.publish(AudioEvent::StopMusic { fade_duration: 1.0 });

        match rx.try_recv().unwrap() {
            AudioEvent::StopMusic { fade_duration } => assert_eq!(fade_duration, 1.0),
            _ => panic!("Wrong event type received"),
        }
    }

    #[test]
    fn test_events_arrive_in_publish_order() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();

        bus.publish(AudioEvent::PauseMusic { fade_duration: 0.5 });
        bus.publish(AudioEvent::PlaySfx(SfxRequest::new("Click")));

        assert!(matches!(rx.try_recv(), Ok(AudioEvent::PauseMusic { .. })));
        assert!(matches!(rx.try_recv(), Ok(AudioEvent::PlaySfx(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_event_bus_multiple_subscribers() {
        let bus = EventBus::new();
        let (rx1, _id1) = bus.subscribe();
        let (rx2, _id2) = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(AudioEvent::StopAmbient { fade_duration: 0.0 });

        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_publish_from_another_thread() {
        let bus = EventBus::new();
        let (rx, _id) = bus.subscribe();

        let producer = bus.clone();
        std::thread::spawn(move || {
            producer.publish(AudioEvent::StopMusic { fade_duration: 2.0 });
        })
        .join()
        .unwrap();

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_receiver_is_pruned_on_publish() {
        let bus = EventBus::new();
        let (rx1, _id1) = bus.subscribe();
        let (rx2, _id2) = bus.subscribe();
        drop(rx1);
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(AudioEvent::StopMusic { fade_duration: 1.0 });
        assert_eq!(bus.subscriber_count(), 1);
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_ids_unique_across_clones() {
        let bus = EventBus::new();
        let other = bus.clone();
        let (_rx1, id1) = bus.subscribe();
        let (_rx2, id2) = other.subscribe();
        assert_ne!(id1, id2);

        other.unsubscribe(id1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_event_bus_clone() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();

        let (_rx, _id) = bus1.subscribe();
        assert_eq!(bus1.subscriber_count(), 1);
        assert_eq!(bus2.subscriber_count(), 1); // Shared state
    }
}
