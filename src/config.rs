use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio_system::Position;
use crate::error::ConfigError;
use crate::state::FadeMode;

/// Where each catalog's buffers live, relative to `root`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetLocations {
    /// Base directory of the audio assets
    pub root: PathBuf,

    /// Background music tracks
    pub music: String,

    /// Ambient tracks
    pub ambient: String,

    /// One-shot sound effects
    pub sfx: String,
}

impl Default for AssetLocations {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            music: "Audio/BGM".to_string(),
            ambient: "Audio/Ambient".to_string(),
            sfx: "Audio/SFX".to_string(),
        }
    }
}

/// Initial fade settings of a channel, used until the first request overrides them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelDefaults {
    pub fade_mode: FadeMode,

    /// Seconds
    pub fade_duration: f32,
}

impl Default for ChannelDefaults {
    fn default() -> Self {
        Self {
            fade_mode: FadeMode::Crossfade,
            fade_duration: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub assets: AssetLocations,

    #[serde(default)]
    pub music: ChannelDefaults,

    #[serde(default)]
    pub ambient: ChannelDefaults,

    /// Frame ticks per second driving the fades
    pub tick_rate_hz: u32,

    /// Where unanchored instances are created (the engine's own position)
    pub reference_position: Position,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assets: AssetLocations::default(),
            music: ChannelDefaults::default(),
            ambient: ChannelDefaults::default(),
            tick_rate_hz: 60,
            reference_position: [0.0, 0.0, 0.0],
        }
    }
}

impl EngineConfig {
    /// Load configuration from `path`.
    /// Writes and returns the defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = EngineConfig::default();
            config.save(path)?;
            tracing::info!("Created default config at: {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let config: EngineConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid("tick_rate_hz must be positive".to_string()));
        }
        for (label, defaults) in [("music", &self.music), ("ambient", &self.ambient)] {
            if !defaults.fade_duration.is_finite() || defaults.fade_duration < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} fade_duration must be a non-negative number",
                    label
                )));
            }
        }
        Ok(())
    }

    /// Default config file location in the user config folder
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("AudioFadeEngine"))
            .unwrap_or_else(|| PathBuf::from("config"))
            .join("engine.json")
    }

    /// Wall-clock length of one frame tick
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.music.fade_mode, FadeMode::Crossfade);
        assert_eq!(config.ambient.fade_duration, 1.5);
        assert_eq!(config.assets.music, "Audio/BGM");
        assert_eq!(config.assets.sfx, "Audio/SFX");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let json = r#"{ "tick_rate_hz": 30, "reference_position": [1.0, 2.0, 3.0] }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.tick_rate_hz, 30);
        assert_eq!(config.assets, AssetLocations::default());
        assert_eq!(config.reference_position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.tick_rate_hz = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = EngineConfig::default();
        config.ambient.fade_duration = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_creates_defaults_then_round_trips() {
        let dir = std::env::temp_dir().join(format!("audio-fade-config-{}", std::process::id()));
        let path = dir.join("engine.json");
        let _ = fs::remove_file(&path);

        let created = EngineConfig::load(&path).unwrap();
        assert!(path.exists());

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(created, loaded);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_tick_interval() {
        let mut config = EngineConfig::default();
        config.tick_rate_hz = 50;
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }
}
