/// Rodio playback backend
///
/// Preloads every buffer into memory and plays each instance on its own
/// `rodio::Sink`. Pitch maps to sink speed. Spatial blend is only recorded and
/// positions are only logged: rodio sinks have no 3D panning.
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::backend::{AssetSource, BufferHandle, PlaybackBackend, PlaybackHandle, Position};
use crate::error::AudioError;

/// File extensions picked up when enumerating an asset directory
const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "wav", "ogg", "flac"];

/// Slowest speed handed to a sink; a zero speed stalls rodio's resampler
const MIN_SPEED: f32 = 0.01;

struct LoadedBuffer {
    name: String,
    data: Arc<Vec<u8>>,
    duration: f32,
}

struct Voice {
    buffer: BufferHandle,
    sink: Sink,
    started: bool,
    looping: bool,
    volume: f32,
    pitch: f32,
    spatial_blend: f32,
}

/// Backend playing through the default output device
pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    root: PathBuf,
    buffers: Vec<LoadedBuffer>,
    voices: HashMap<PlaybackHandle, Voice>,
    next_handle: u64,
}

impl RodioBackend {
    /// Open the default output device. Asset locations resolve relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::Backend(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            root: root.into(),
            buffers: Vec::new(),
            voices: HashMap::new(),
            next_handle: 0,
        })
    }

    /// Read a file into memory and register it as a buffer
    pub fn load_file(&mut self, path: &Path) -> Result<BufferHandle, AudioError> {
        let load_err = |reason: String| AudioError::AssetLoad {
            location: path.display().to_string(),
            reason,
        };

        let data = fs::read(path).map_err(|e| load_err(e.to_string()))?;
        let duration = measure_duration(&data).map_err(load_err)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::info!(
            "Preloaded audio '{}' ({} bytes, {:.2}s)",
            name,
            data.len(),
            duration
        );

        let handle = BufferHandle::new(self.buffers.len());
        self.buffers.push(LoadedBuffer {
            name,
            data: Arc::new(data),
            duration,
        });
        Ok(handle)
    }

    /// Number of instances not yet released
    pub fn live_count(&self) -> usize {
        self.voices.len()
    }

    fn start(&mut self, handle: PlaybackHandle) -> Result<(), AudioError> {
        let Some(voice) = self.voices.get_mut(&handle) else {
            return Ok(());
        };
        let buffer = self
            .buffers
            .get(voice.buffer.id())
            .ok_or_else(|| AudioError::Backend(format!("unknown buffer {}", voice.buffer.id())))?;

        // Decoder requires owned data with a 'static lifetime
        let cursor = Cursor::new((*buffer.data).clone());
        let decoder = Decoder::new(cursor).map_err(|e| AudioError::Backend(e.to_string()))?;

        let source: Box<dyn Source<Item = i16> + Send> = if voice.looping {
            Box::new(decoder.repeat_infinite())
        } else {
            Box::new(decoder)
        };
        voice.sink.append(source);
        voice.started = true;
        tracing::trace!("Started '{}' on instance {}", buffer.name, handle.id());
        Ok(())
    }
}

/// Decode once to verify the data and find its length in seconds
fn measure_duration(data: &[u8]) -> Result<f32, String> {
    let decoder = Decoder::new(Cursor::new(data.to_vec())).map_err(|e| e.to_string())?;
    if let Some(duration) = decoder.total_duration() {
        return Ok(duration.as_secs_f32());
    }

    let channels = u64::from(decoder.channels().max(1));
    let sample_rate = u64::from(decoder.sample_rate().max(1));
    let samples = decoder.count() as u64;
    Ok(samples as f32 / (channels * sample_rate) as f32)
}

impl AssetSource for RodioBackend {
    fn load_all(&mut self, location: &str) -> Result<Vec<(String, BufferHandle)>, AudioError> {
        let dir = self.root.join(location);
        let entries = fs::read_dir(&dir).map_err(|e| AudioError::AssetLoad {
            location: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        // Stable enumeration order keeps catalog indices stable between runs
        paths.sort();

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_file(&path) {
                Ok(handle) => loaded.push((self.buffers[handle.id()].name.clone(), handle)),
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(loaded)
    }
}

impl PlaybackBackend for RodioBackend {
    fn create_instance(
        &mut self,
        buffer: BufferHandle,
        position: Position,
        parent: Option<u64>,
    ) -> Result<PlaybackHandle, AudioError> {
        if buffer.id() >= self.buffers.len() {
            return Err(AudioError::Backend(format!("unknown buffer {}", buffer.id())));
        }

        let sink =
            Sink::try_new(&self.stream_handle).map_err(|e| AudioError::Backend(e.to_string()))?;
        sink.pause();

        let handle = PlaybackHandle::new(self.next_handle);
        self.next_handle += 1;
        self.voices.insert(
            handle,
            Voice {
                buffer,
                sink,
                started: false,
                looping: false,
                volume: 1.0,
                pitch: 1.0,
                spatial_blend: 0.0,
            },
        );
        tracing::trace!(
            "Created instance {} at {:?} (parent {:?})",
            handle.id(),
            position,
            parent
        );
        Ok(handle)
    }

    fn play(&mut self, handle: PlaybackHandle) {
        let needs_source = self
            .voices
            .get(&handle)
            .map(|v| !v.started)
            .unwrap_or(false);
        if needs_source {
            if let Err(e) = self.start(handle) {
                tracing::warn!("Could not start instance {}: {}", handle.id(), e);
                return;
            }
        }
        if let Some(voice) = self.voices.get(&handle) {
            voice.sink.play();
        }
    }

    fn stop(&mut self, handle: PlaybackHandle) {
        if let Some(voice) = self.voices.get(&handle) {
            voice.sink.stop();
        }
    }

    fn pause(&mut self, handle: PlaybackHandle) {
        if let Some(voice) = self.voices.get(&handle) {
            voice.sink.pause();
        }
    }

    fn resume(&mut self, handle: PlaybackHandle) {
        if let Some(voice) = self.voices.get(&handle) {
            voice.sink.play();
        }
    }

    fn set_volume(&mut self, handle: PlaybackHandle, volume: f32) {
        if let Some(voice) = self.voices.get_mut(&handle) {
            voice.volume = volume.clamp(0.0, 1.0);
            voice.sink.set_volume(voice.volume);
        }
    }

    fn set_pitch(&mut self, handle: PlaybackHandle, pitch: f32) {
        if let Some(voice) = self.voices.get_mut(&handle) {
            voice.pitch = pitch;
            voice.sink.set_speed(pitch.max(MIN_SPEED));
        }
    }

    fn set_spatial_blend(&mut self, handle: PlaybackHandle, blend: f32) {
        if let Some(voice) = self.voices.get_mut(&handle) {
            voice.spatial_blend = blend.clamp(0.0, 1.0);
        }
    }

    fn set_looping(&mut self, handle: PlaybackHandle, looping: bool) {
        if let Some(voice) = self.voices.get_mut(&handle) {
            voice.looping = looping;
        }
    }

    fn release(&mut self, handle: PlaybackHandle) {
        if let Some(voice) = self.voices.remove(&handle) {
            voice.sink.stop();
            tracing::trace!("Released instance {}", handle.id());
        }
    }

    fn is_playing(&self, handle: PlaybackHandle) -> bool {
        self.voices
            .get(&handle)
            .map(|v| v.started && !v.sink.is_paused() && !v.sink.empty())
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
