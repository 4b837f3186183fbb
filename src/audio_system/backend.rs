/// Playback backend contract
///
/// The transition engine never touches audio hardware directly. Everything it
/// needs from the outside world goes through these two traits: an
/// [`AssetSource`] that enumerates buffers once at startup, and a
/// [`PlaybackBackend`] that creates and drives sounding instances.
use crate::error::AudioError;

/// World position of an instance or anchor
pub type Position = [f32; 3];

/// Opaque handle to a loaded audio buffer, owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(usize);

impl BufferHandle {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn id(&self) -> usize {
        self.0
    }
}

/// Opaque handle to one sounding instance, owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(u64);

impl PlaybackHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A spatial anchor that instances can be parented to so they follow it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub id: u64,
    pub position: Position,
}

impl Anchor {
    pub fn new(id: u64, position: Position) -> Self {
        Self { id, position }
    }
}

/// Enumerates the audio buffers stored at a logical location
pub trait AssetSource {
    /// Returns `(name, buffer)` pairs in a stable enumeration order
    fn load_all(&mut self, location: &str) -> Result<Vec<(String, BufferHandle)>, AudioError>;
}

/// Operations the engine needs on playback instances.
///
/// Calls with a handle the backend no longer knows are ignored; getters
/// return neutral values (volume 0, pitch 1, blend 0, not playing).
pub trait PlaybackBackend {
    /// Create a stopped instance of `buffer` at `position`, optionally parented to an anchor
    fn create_instance(
        &mut self,
        buffer: BufferHandle,
        position: Position,
        parent: Option<u64>,
    ) -> Result<PlaybackHandle, AudioError>;

    fn play(&mut self, handle: PlaybackHandle);
    fn stop(&mut self, handle: PlaybackHandle);
    fn pause(&mut self, handle: PlaybackHandle);
    fn resume(&mut self, handle: PlaybackHandle);

    fn set_volume(&mut self, handle: PlaybackHandle, volume: f32);
    fn set_pitch(&mut self, handle: PlaybackHandle, pitch: f32);
    fn set_spatial_blend(&mut self, handle: PlaybackHandle, blend: f32);

    /// Must be called before the first `play` to take effect
    fn set_looping(&mut self, handle: PlaybackHandle, looping: bool);

    /// Destroy the instance. The handle is invalid afterwards.
    fn release(&mut self, handle: PlaybackHandle);

    fn is_playing(&self, handle: PlaybackHandle) -> bool;
    fn volume(&self, handle: PlaybackHandle) -> f32;
    fn pitch(&self, handle: PlaybackHandle) -> f32;
    fn spatial_blend(&self, handle: PlaybackHandle) -> f32;

    /// Length of the buffer in seconds at pitch 1.0
    fn duration(&self, buffer: BufferHandle) -> f32;
}
