pub mod backend;
pub mod effects;
pub mod manager;
pub mod memory;
pub mod registry;
pub mod rodio_backend;
pub mod sfx;
/// Audio system module
///
/// Provides an engine-agnostic transition engine supporting:
/// - Two looping channels (music, ambient) with crossfades and sequential fades
/// - Fire-and-forget sound effects with chance gating and pitch randomization
/// - Fade-out stops and fade pause/resume toggles
///
/// ## Architecture
///
/// ```text
/// AudioDirector
///   ├── TransitionController (Music)    ─┐
///   ├── TransitionController (Ambient)  ─┤ Independent
///   └── SoundEffectTrigger              ─┘ channels
///
/// Each TransitionController runs at most one ramp task:
///   ├── Crossfade      (old down, new up, same ramp)
///   ├── FadeOutThenIn  (sequential fade)
///   ├── FadeOutStop / FadeOutPause
///   └── FadeInResume
///
/// Everything talks to the engine through PlaybackBackend
///   ├── RodioBackend   (default output device)
///   └── MemoryBackend  (headless, records every call)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let mut backend = MemoryBackend::new();
/// backend.add_buffer("Audio/BGM", "Theme", 120.0);
/// let registry = TrackRegistry::load(&mut backend, &config.assets);
///
/// let bus = EventBus::new();
/// let mut director = AudioDirector::new(backend, registry, &config, bus.clone());
///
/// bus.publish(AudioEvent::PlayMusic { name: "Theme".into(), /* ... */ });
/// director.tick(1.0 / 60.0);
/// ```
pub mod source;
pub mod transition;

// Re-export commonly used types
pub use backend::{Anchor, AssetSource, BufferHandle, PlaybackBackend, PlaybackHandle, Position};
pub use effects::{Levels, Ramp, ReleaseTimer};
pub use manager::AudioDirector;
pub use memory::MemoryBackend;
pub use registry::{TrackCatalog, TrackEntry, TrackRegistry};
pub use rodio_backend::RodioBackend;
pub use sfx::{SfxRequest, SoundEffectTrigger};
pub use source::Channel;
pub use transition::{PlayRequest, TrackRef, TransitionController};
