use anyhow::{bail, Result};
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::file::AudioFile;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Sample rate for generated sources
    pub sample_rate: u32,
    /// Channel count for generated sources (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
    /// Deliver frames at wall-clock pace instead of as fast as possible
    pub realtime: bool,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            buffer_duration_ms: 100,
            realtime: true,
        }
    }
}

/// Audio capture backend trait
///
/// A backend is the microphone side of a recorder: it produces PCM frames
/// until it is stopped or runs out of input.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames. The
    /// channel closes when the backend stops or its input is exhausted.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio source type
#[derive(Debug, Clone)]
pub enum AudioSource {
    /// Replay a WAV file as if it were coming from a microphone
    File(PathBuf),
    /// Continuous sine tone at the given frequency
    Tone { frequency_hz: f32 },
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create audio backend for the given source
    pub fn create(source: AudioSource, config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>> {
        match source {
            AudioSource::File(path) => {
                if !path.exists() {
                    bail!("Input file not found: {}", path.display());
                }
                Ok(Box::new(FileBackend::new(path, config)))
            }
            AudioSource::Tone { frequency_hz } => {
                if !(frequency_hz > 0.0 && frequency_hz < config.sample_rate as f32 / 2.0) {
                    bail!(
                        "Tone frequency {}Hz is outside (0, {}Hz)",
                        frequency_hz,
                        config.sample_rate / 2
                    );
                }
                Ok(Box::new(ToneBackend::new(frequency_hz, config)))
            }
        }
    }
}

/// Frame pump shared by the in-process backends.
struct Pump {
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Pump {
    fn new() -> Self {
        Self {
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    fn spawn<I>(&mut self, frames: I, pace: Option<Duration>) -> mpsc::Receiver<AudioFrame>
    where
        I: Iterator<Item = AudioFrame> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(100);
        let capturing = Arc::clone(&self.capturing);
        capturing.store(true, Ordering::SeqCst);

        self.task = Some(tokio::spawn(async move {
            for frame in frames {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(frame).await.is_err() {
                    debug!("Frame receiver dropped, stopping pump");
                    break;
                }
                if let Some(pace) = pace {
                    tokio::time::sleep(pace).await;
                }
            }
            capturing.store(false, Ordering::SeqCst);
        }));

        rx
    }

    async fn stop(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
            // Aborted tasks resolve with a cancellation error; the sender is dropped either way
            let _ = task.await;
        }
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }
}

/// Replays a WAV file as a stream of capture frames.
pub struct FileBackend {
    path: PathBuf,
    config: AudioBackendConfig,
    pump: Pump,
}

impl FileBackend {
    pub fn new(path: PathBuf, config: AudioBackendConfig) -> Self {
        Self {
            path,
            config,
            pump: Pump::new(),
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.pump.is_capturing() {
            bail!("Already capturing");
        }

        let audio = AudioFile::open(&self.path)?;
        let frames = audio.frames(self.config.buffer_duration_ms);

        info!(
            "Replaying {} as capture input ({} frames)",
            self.path.display(),
            frames.len()
        );

        let pace = self
            .config
            .realtime
            .then(|| Duration::from_millis(self.config.buffer_duration_ms));

        Ok(self.pump.spawn(frames.into_iter(), pace))
    }

    async fn stop(&mut self) -> Result<()> {
        self.pump.stop().await;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.pump.is_capturing()
    }

    fn name(&self) -> &str {
        "file replay"
    }
}

/// Generates a continuous sine tone until stopped.
pub struct ToneBackend {
    frequency_hz: f32,
    config: AudioBackendConfig,
    pump: Pump,
}

impl ToneBackend {
    pub fn new(frequency_hz: f32, config: AudioBackendConfig) -> Self {
        Self {
            frequency_hz,
            config,
            pump: Pump::new(),
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for ToneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.pump.is_capturing() {
            bail!("Already capturing");
        }

        info!(
            "Starting {}Hz tone ({}Hz, {} channels)",
            self.frequency_hz, self.config.sample_rate, self.config.channels
        );

        let frames = ToneFrames {
            frequency_hz: self.frequency_hz,
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            frame_ms: self.config.buffer_duration_ms,
            index: 0,
        };

        // A tone never ends, so it is always paced
        let pace = Duration::from_millis(self.config.buffer_duration_ms);
        Ok(self.pump.spawn(frames, Some(pace)))
    }

    async fn stop(&mut self) -> Result<()> {
        self.pump.stop().await;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.pump.is_capturing()
    }

    fn name(&self) -> &str {
        "sine tone"
    }
}

struct ToneFrames {
    frequency_hz: f32,
    sample_rate: u32,
    channels: u16,
    frame_ms: u64,
    index: u64,
}

impl Iterator for ToneFrames {
    type Item = AudioFrame;

    fn next(&mut self) -> Option<AudioFrame> {
        let frames_per_buffer = (self.sample_rate as u64 * self.frame_ms / 1000).max(1);
        let start = self.index * frames_per_buffer;
        let amplitude = i16::MAX as f32 * 0.5;

        let mut samples = Vec::with_capacity((frames_per_buffer * self.channels as u64) as usize);
        for n in start..start + frames_per_buffer {
            let t = n as f32 / self.sample_rate as f32;
            let value = (TAU * self.frequency_hz * t).sin() * amplitude;
            for _ in 0..self.channels {
                samples.push(value as i16);
            }
        }

        let frame = AudioFrame {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp_ms: self.index * self.frame_ms,
        };
        self.index += 1;
        Some(frame)
    }
}
