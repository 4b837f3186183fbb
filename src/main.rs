use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use sysinfo::System;

use audio_fade_engine::audio_system::{AudioDirector, Channel, RodioBackend, SfxRequest, TrackRegistry};
use audio_fade_engine::{AppResult, AudioEvent, EngineConfig, EventBus, FadeMode};

const LOG_TARGET_STARTUP: &str = "audio_fade_engine::startup";

/// Hard cap on how long the scripted demo runs
const DEMO_LENGTH: Duration = Duration::from_secs(30);

/// Initialize tracing with file rotation
///
/// Logs are written to:
/// - macOS: ~/Library/Application Support/AudioFadeEngine/logs/
/// - Windows: %APPDATA%/AudioFadeEngine/logs/
/// - Linux: ~/.config/AudioFadeEngine/logs/
///
/// Log output:
/// - Debug builds: Console + File
/// - Release builds: File only
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("AudioFadeEngine").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "audio-fade-engine.log");

    // Info level by default
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let mut system = System::new();
    system.refresh_cpu();

    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting audio fade demo v{} on ({})",
        version,
        std::env::consts::ARCH
    );
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);
    tracing::debug!(target: LOG_TARGET_STARTUP, "CPU cores: {}", system.cpus().len());
}

/// Queue a short scripted session: music and ambience fade in, a few sound
/// effects fire, the music crosses over to the next track, then both
/// channels fade out once they are idle.
fn queue_demo(director: &mut AudioDirector<RodioBackend>, bus: &EventBus) {
    let music: Vec<String> = director.registry().music.names().map(str::to_string).collect();
    let ambient_available = !director.registry().ambient.is_empty();
    let effects: Vec<String> = director.registry().sfx.names().map(str::to_string).collect();

    if let Some(first) = music.first() {
        bus.publish(AudioEvent::PlayMusic {
            index: 0,
            name: first.clone(),
            volume: 0.8,
            fade_mode: FadeMode::SequentialFade,
            fade_duration: 2.0,
            looping: true,
            tag: "demo-intro".to_string(),
        });
    }
    if ambient_available {
        bus.publish(AudioEvent::PlayAmbient {
            anchor: None,
            index: 0,
            name: String::new(),
            volume: 0.5,
            pitch: 1.0,
            spatial_blend: 0.0,
            fade_mode: FadeMode::Crossfade,
            fade_duration: 3.0,
            looping: true,
            tag: "demo-ambience".to_string(),
        });
    }
    if !effects.is_empty() {
        for _ in 0..3 {
            director.schedule_after_random(
                AudioEvent::PlaySfx(SfxRequest::one_of(effects.clone()).with_tag("demo-sfx")),
                8.0,
            );
        }
    }
    if let Some(second) = music.get(1) {
        director.schedule_after(
            AudioEvent::PlayMusic {
                index: 1,
                name: second.clone(),
                volume: 0.8,
                fade_mode: FadeMode::Crossfade,
                fade_duration: 4.0,
                looping: true,
                tag: "demo-crossover".to_string(),
            },
            10.0,
        );
    }

    director.schedule_after(AudioEvent::PauseAmbient { fade_duration: 1.0 }, 16.0);
    director.schedule_after(AudioEvent::PauseAmbient { fade_duration: 1.0 }, 19.0);

    // Stops only make sense once the channel has settled
    director.schedule_after(AudioEvent::StopMusic { fade_duration: 3.0 }, 22.0);
    director.schedule_after(AudioEvent::StopAmbient { fade_duration: 3.0 }, 22.0);
}

fn run() -> AppResult<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(EngineConfig::default_path);
    let config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let mut backend =
        RodioBackend::new(&config.assets.root).context("opening the default audio output")?;
    let registry = TrackRegistry::load(&mut backend, &config.assets);

    let bus = EventBus::new();
    let mut director = AudioDirector::new(backend, registry, &config, bus.clone());
    queue_demo(&mut director, &bus);

    let interval = config.tick_interval();
    let started = Instant::now();
    let mut last = started;
    loop {
        std::thread::sleep(interval);
        let now = Instant::now();
        director.tick(now.duration_since(last).as_secs_f32());
        last = now;

        let settled = director.scheduled_count() == 0
            && director.live_effects() == 0
            && Channel::all().iter().all(|&channel| {
                !director.is_transitioning(channel)
                    && director.channel_state(channel).current_source.is_none()
            });
        if settled || now.duration_since(started) >= DEMO_LENGTH {
            break;
        }
    }

    director.shutdown();
    Ok(())
}

fn main() {
    initialize_tracing();
    log_runtime_environment();

    if let Err(e) = run() {
        tracing::error!("Demo failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
