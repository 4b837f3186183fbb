/// Track registry
///
/// Catalogs of loaded buffers, addressable by dense index or unique name.
/// Populated once at startup and read-only afterwards.
use std::collections::HashMap;

use super::backend::{AssetSource, BufferHandle};
use super::source::Channel;
use crate::config::AssetLocations;
use crate::error::AudioError;

/// One catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEntry {
    pub name: String,
    pub buffer: BufferHandle,
}

/// Buffers indexed by position and by name
#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    label: String,
    entries: Vec<TrackEntry>,
    by_name: HashMap<String, usize>,
}

impl TrackCatalog {
    /// Create an empty catalog. `label` names it in log lines and errors.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Build a catalog from entries in enumeration order
    pub fn from_entries<I>(label: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, BufferHandle)>,
    {
        let mut catalog = Self::new(label);
        for (name, buffer) in entries {
            catalog.push(name, buffer);
        }
        catalog
    }

    /// Enumerate every buffer at `location`.
    ///
    /// Failures and empty locations are logged and produce an empty catalog.
    pub fn load(source: &mut dyn AssetSource, label: &str, location: &str) -> Self {
        match source.load_all(location) {
            Ok(entries) => {
                let catalog = Self::from_entries(label, entries);
                if catalog.is_empty() {
                    tracing::warn!("No {} audio found at '{}'", label, location);
                } else {
                    tracing::info!(
                        "Loaded {} {} tracks from '{}'",
                        catalog.len(),
                        label,
                        location
                    );
                }
                catalog
            }
            Err(e) => {
                tracing::warn!("Could not load {} audio: {}", label, e);
                Self::new(label)
            }
        }
    }

    fn push(&mut self, name: String, buffer: BufferHandle) {
        let index = self.entries.len();
        if self.by_name.contains_key(&name) {
            tracing::warn!(
                "Duplicate {} track name '{}' at index {}; name lookups keep the first",
                self.label,
                name,
                index
            );
        } else {
            self.by_name.insert(name.clone(), index);
        }
        self.entries.push(TrackEntry { name, buffer });
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackEntry> {
        self.entries.get(index)
    }

    /// Exact-name lookup
    pub fn find(&self, name: &str) -> Option<BufferHandle> {
        self.by_name.get(name).map(|&i| self.entries[i].buffer)
    }

    /// Resolve a track reference: a non-empty name wins, otherwise a non-negative index
    pub fn resolve(&self, index: i32, name: &str) -> Result<BufferHandle, AudioError> {
        if !name.is_empty() {
            return self.find(name).ok_or_else(|| AudioError::TrackNotFound {
                catalog: self.label.clone(),
                track: format!("'{}'", name),
            });
        }

        usize::try_from(index)
            .ok()
            .and_then(|i| self.get(i))
            .map(|entry| entry.buffer)
            .ok_or_else(|| AudioError::TrackNotFound {
                catalog: self.label.clone(),
                track: format!("#{}", index),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }
}

/// The three catalogs loaded at startup
#[derive(Debug, Clone)]
pub struct TrackRegistry {
    pub music: TrackCatalog,
    pub ambient: TrackCatalog,
    pub sfx: TrackCatalog,
}

impl TrackRegistry {
    pub fn new(music: TrackCatalog, ambient: TrackCatalog, sfx: TrackCatalog) -> Self {
        Self {
            music,
            ambient,
            sfx,
        }
    }

    /// Load all three catalogs from their configured locations
    pub fn load(source: &mut dyn AssetSource, locations: &AssetLocations) -> Self {
        Self {
            music: TrackCatalog::load(source, Channel::Music.catalog_label(), &locations.music),
            ambient: TrackCatalog::load(
                source,
                Channel::Ambient.catalog_label(),
                &locations.ambient,
            ),
            sfx: TrackCatalog::load(source, "sfx", &locations.sfx),
        }
    }

    /// Track catalog backing a looping channel
    pub fn catalog(&self, channel: Channel) -> &TrackCatalog {
        match channel {
            Channel::Music => &self.music,
            Channel::Ambient => &self.ambient,
        }
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new(
            TrackCatalog::new(Channel::Music.catalog_label()),
            TrackCatalog::new(Channel::Ambient.catalog_label()),
            TrackCatalog::new("sfx"),
        )
    }
}
