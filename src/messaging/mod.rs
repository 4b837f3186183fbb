/// Messaging module for audio requests
///
/// Producers never call the audio channels directly. They publish
/// `AudioEvent`s on the bus (from any thread); the director drains its
/// subscription once per tick and routes each request.
///
/// ## Architecture
///
/// ```text
/// ┌──────────┐   AudioEvent   ┌───────────┐   drain on tick   ┌───────────────┐
/// │ Producer │ ─────────────> │ Event Bus │ ────────────────> │ AudioDirector │
/// │ (trigger │                │           │                   │               │
/// │  volume) │                └───────────┘                   └───────────────┘
/// └──────────┘                                                   │    ▲
///                                                      schedule  │    │ ready events
///                                                                ▼    │
///                                                          ┌──────────────────┐
///                                                          │ RequestScheduler │
///                                                          └──────────────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let bus = EventBus::new();
/// let mut director = AudioDirector::new(backend, registry, &config, bus.clone());
///
/// bus.publish(AudioEvent::PlaySfx(SfxRequest::new("Door")));
///
/// // Once per frame
/// director.tick(dt);
/// ```

pub mod bus;
pub mod events;
pub mod scheduler;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use events::AudioEvent;
pub use scheduler::RequestScheduler;
