/// In-memory playback backend
///
/// Deterministic backend that keeps every instance in a map and counts the
/// calls made against it. Used for headless runs and by the test suite.
use std::collections::HashMap;

use super::backend::{AssetSource, BufferHandle, PlaybackBackend, PlaybackHandle, Position};
use crate::error::AudioError;

/// Playback status of an in-memory instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStatus {
    Created,
    Playing,
    Paused,
    Stopped,
}

/// Everything the backend knows about one instance
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub buffer: BufferHandle,
    pub position: Position,
    pub parent: Option<u64>,
    pub status: VoiceStatus,
    pub volume: f32,
    pub pitch: f32,
    pub spatial_blend: f32,
    pub looping: bool,
}

#[derive(Debug, Clone)]
struct StoredBuffer {
    name: String,
    duration: f32,
}

/// Call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub created: usize,
    pub played: usize,
    pub stopped: usize,
    pub paused: usize,
    pub resumed: usize,
    pub released: usize,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    buffers: Vec<StoredBuffer>,
    locations: HashMap<String, Vec<BufferHandle>>,
    voices: HashMap<PlaybackHandle, Voice>,
    next_handle: u64,
    stats: CallStats,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a buffer under `location`; enumeration order is insertion order
    pub fn add_buffer(&mut self, location: &str, name: &str, duration: f32) -> BufferHandle {
        let handle = BufferHandle::new(self.buffers.len());
        self.buffers.push(StoredBuffer {
            name: name.to_string(),
            duration,
        });
        self.locations
            .entry(location.to_string())
            .or_default()
            .push(handle);
        handle
    }

    pub fn voice(&self, handle: PlaybackHandle) -> Option<&Voice> {
        self.voices.get(&handle)
    }

    /// Number of instances created and not yet released
    pub fn live_count(&self) -> usize {
        self.voices.len()
    }

    pub fn stats(&self) -> CallStats {
        self.stats
    }

    pub fn buffer_name(&self, buffer: BufferHandle) -> Option<&str> {
        self.buffers.get(buffer.id()).map(|b| b.name.as_str())
    }

    fn with_voice(&mut self, handle: PlaybackHandle, f: impl FnOnce(&mut Voice)) {
        if let Some(voice) = self.voices.get_mut(&handle) {
            f(voice);
        }
    }
}

impl AssetSource for MemoryBackend {
    fn load_all(&mut self, location: &str) -> Result<Vec<(String, BufferHandle)>, AudioError> {
        let handles = self
            .locations
            .get(location)
            .ok_or_else(|| AudioError::AssetLoad {
                location: location.to_string(),
                reason: "no such location".to_string(),
            })?;

        Ok(handles
            .iter()
            .map(|&h| (self.buffers[h.id()].name.clone(), h))
            .collect())
    }
}

impl PlaybackBackend for MemoryBackend {
    fn create_instance(
        &mut self,
        buffer: BufferHandle,
        position: Position,
        parent: Option<u64>,
    ) -> Result<PlaybackHandle, AudioError> {
        if buffer.id() >= self.buffers.len() {
            return Err(AudioError::Backend(format!(
                "unknown buffer {}",
                buffer.id()
            )));
        }

        let handle = PlaybackHandle::new(self.next_handle);
        self.next_handle += 1;
        self.voices.insert(
            handle,
            Voice {
                buffer,
                position,
                parent,
                status: VoiceStatus::Created,
                volume: 1.0,
                pitch: 1.0,
                spatial_blend: 0.0,
                looping: false,
            },
        );
        self.stats.created += 1;
        Ok(handle)
    }

    fn play(&mut self, handle: PlaybackHandle) {
        if self.voices.contains_key(&handle) {
            self.stats.played += 1;
        }
        self.with_voice(handle, |v| v.status = VoiceStatus::Playing);
    }

    fn stop(&mut self, handle: PlaybackHandle) {
        if self.voices.contains_key(&handle) {
            self.stats.stopped += 1;
        }
        self.with_voice(handle, |v| v.status = VoiceStatus::Stopped);
    }

    fn pause(&mut self, handle: PlaybackHandle) {
        if self.voices.contains_key(&handle) {
            self.stats.paused += 1;
        }
        self.with_voice(handle, |v| {
            if v.status == VoiceStatus::Playing {
                v.status = VoiceStatus::Paused;
            }
        });
    }

    fn resume(&mut self, handle: PlaybackHandle) {
        if self.voices.contains_key(&handle) {
            self.stats.resumed += 1;
        }
        self.with_voice(handle, |v| {
            if v.status == VoiceStatus::Paused {
                v.status = VoiceStatus::Playing;
            }
        });
    }

    fn set_volume(&mut self, handle: PlaybackHandle, volume: f32) {
        self.with_voice(handle, |v| v.volume = volume.clamp(0.0, 1.0));
    }

    fn set_pitch(&mut self, handle: PlaybackHandle, pitch: f32) {
        self.with_voice(handle, |v| v.pitch = pitch);
    }

    fn set_spatial_blend(&mut self, handle: PlaybackHandle, blend: f32) {
        self.with_voice(handle, |v| v.spatial_blend = blend.clamp(0.0, 1.0));
    }

    fn set_looping(&mut self, handle: PlaybackHandle, looping: bool) {
        self.with_voice(handle, |v| v.looping = looping);
    }

    fn release(&mut self, handle: PlaybackHandle) {
        if self.voices.remove(&handle).is_some() {
            self.stats.released += 1;
        }
    }

    fn is_playing(&self, handle: PlaybackHandle) -> bool {
        self.voices
            .get(&handle)
            .map(|v| v.status == VoiceStatus::Playing)
            .unwrap_or(false)
    }

    fn volume(&self, handle: PlaybackHandle) -> f32 {
        self.voices.get(&handle).map(|v| v.volume).unwrap_or(0.0)
    }

    fn pitch(&self, handle: PlaybackHandle) -> f32 {
        self.voices.get(&handle).map(|v| v.pitch).unwrap_or(1.0)
    }

    fn spatial_blend(&self, handle: PlaybackHandle) -> f32 {
        self.voices
            .get(&handle)
            .map(|v| v.spatial_blend)
            .unwrap_or(0.0)
    }

    fn duration(&self, buffer: BufferHandle) -> f32 {
        self.buffers
            .get(buffer.id())
            .map(|b| b.duration)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_in_insertion_order() {
        let mut backend = MemoryBackend::new();
        let a = backend.add_buffer("Audio/BGM", "A", 10.0);
        let b = backend.add_buffer("Audio/BGM", "B", 12.0);
        backend.add_buffer("Audio/SFX", "Click", 0.2);

        let loaded = backend.load_all("Audio/BGM").unwrap();
        assert_eq!(loaded, vec![("A".to_string(), a), ("B".to_string(), b)]);
        assert!(backend.load_all("Audio/Nowhere").is_err());
    }

    #[test]
    fn test_instance_lifecycle() {
        let mut backend = MemoryBackend::new();
        let buffer = backend.add_buffer("Audio/SFX", "Click", 0.2);

        let handle = backend.create_instance(buffer, [1.0, 0.0, 0.0], None).unwrap();
        assert!(!backend.is_playing(handle));

        backend.play(handle);
        assert!(backend.is_playing(handle));

        backend.pause(handle);
        assert!(!backend.is_playing(handle));
        backend.resume(handle);
        assert!(backend.is_playing(handle));

        backend.release(handle);
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.volume(handle), 0.0);

        let stats = backend.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.released, 1);
        assert_eq!(stats.played, 1);
    }

    #[test]
    fn test_unknown_buffer_rejected() {
        let mut backend = MemoryBackend::new();
        let result = backend.create_instance(BufferHandle::new(3), [0.0; 3], None);
        assert!(matches!(result, Err(AudioError::Backend(_))));
    }
}
