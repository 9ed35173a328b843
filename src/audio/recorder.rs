use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
use super::meter::LevelMeter;
use crate::session::{CaptureDevice, Recorder, RecorderOptions, SessionCategory};

/// Capture device that records an [`AudioSource`] into WAV files.
pub struct WavCaptureDevice {
    source: AudioSource,
    backend_config: AudioBackendConfig,
    category: Mutex<Option<SessionCategory>>,
    active: AtomicBool,
}

impl WavCaptureDevice {
    pub fn new(source: AudioSource, backend_config: AudioBackendConfig) -> Self {
        Self {
            source,
            backend_config,
            category: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn category(&self) -> Option<SessionCategory> {
        *self.category.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavCaptureDevice {
    async fn configure(&self, category: SessionCategory) -> Result<()> {
        debug!("Audio session category set to {:?}", category);
        *self.category.lock().unwrap_or_else(PoisonError::into_inner) = Some(category);
        Ok(())
    }

    async fn set_active(&self, active: bool) -> Result<()> {
        debug!("Audio session active: {}", active);
        self.active.store(active, Ordering::SeqCst);
        Ok(())
    }

    async fn open_recorder(
        &self,
        path: &Path,
        options: &RecorderOptions,
    ) -> Result<Box<dyn Recorder>> {
        match self.category() {
            Some(category) if category.allows_recording() => {}
            Some(category) => bail!("Session category {:?} does not allow recording", category),
            None => bail!("Audio session category has not been configured"),
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create recordings directory")?;
        }

        let backend = AudioBackendFactory::create(self.source.clone(), self.backend_config.clone())
            .context("Failed to create audio backend")?;

        self.active.store(true, Ordering::SeqCst);

        info!(
            "Recorder opened: {} (backend: {})",
            path.display(),
            backend.name()
        );

        Ok(Box::new(WavRecorder::new(
            path.to_path_buf(),
            backend,
            options.clone(),
        )))
    }

    fn name(&self) -> &str {
        "wav capture"
    }
}

/// Records frames from a backend into one WAV file.
///
/// The WAV format follows the first captured frame. A recording that never
/// receives a frame is written as an empty file in the option format.
pub struct WavRecorder {
    location: PathBuf,
    options: RecorderOptions,
    backend: Box<dyn AudioBackend>,
    paused: Arc<AtomicBool>,
    meter: LevelMeter,
    writer_task: Option<JoinHandle<Result<u64>>>,
    finalized: bool,
}

impl WavRecorder {
    pub fn new(location: PathBuf, backend: Box<dyn AudioBackend>, options: RecorderOptions) -> Self {
        Self {
            location,
            options,
            backend,
            paused: Arc::new(AtomicBool::new(false)),
            meter: LevelMeter::new(),
            writer_task: None,
            finalized: false,
        }
    }
}

#[async_trait::async_trait]
impl Recorder for WavRecorder {
    fn location(&self) -> &Path {
        &self.location
    }

    async fn record(&mut self) -> Result<()> {
        if self.finalized {
            bail!("Recorder already finalized");
        }

        self.paused.store(false, Ordering::SeqCst);

        if self.writer_task.is_none() {
            let audio_rx = self.backend.start().await?;
            let writer = FrameWriter {
                location: self.location.clone(),
                options: self.options.clone(),
                paused: Arc::clone(&self.paused),
                meter: self.meter.clone(),
            };
            self.writer_task = Some(tokio::spawn(writer.run(audio_rx)));
            info!("Capture started: {}", self.location.display());
        } else {
            info!("Capture resumed: {}", self.location.display());
        }

        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        if self.writer_task.is_none() {
            bail!("Recorder is not capturing");
        }
        self.paused.store(true, Ordering::SeqCst);
        self.meter.reset();
        info!("Capture paused: {}", self.location.display());
        Ok(())
    }

    async fn finalize(&mut self) -> Result<oneshot::Receiver<bool>> {
        if self.finalized {
            bail!("Recorder already finalized");
        }
        self.finalized = true;

        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop audio backend: {}", e);
        }

        let (done_tx, done_rx) = oneshot::channel();
        let writer_task = self.writer_task.take();
        let location = self.location.clone();
        let options = self.options.clone();

        tokio::spawn(async move {
            let outcome = match writer_task {
                Some(task) => match task.await {
                    Ok(result) => result,
                    Err(e) => Err(anyhow::anyhow!("WAV writer task panicked: {}", e)),
                },
                None => create_writer(&location, options.sample_rate, options.channels)
                    .and_then(|writer| writer.finalize().context("Failed to finalize WAV file"))
                    .map(|_| 0),
            };

            let success = match outcome {
                Ok(samples) => {
                    info!(
                        "Recording finalized: {} ({} samples)",
                        location.display(),
                        samples
                    );
                    true
                }
                Err(e) => {
                    error!("Recording failed to finalize: {:#}", e);
                    false
                }
            };

            // The session may have gone away; nothing else to notify then
            let _ = done_tx.send(success);
        });

        Ok(done_rx)
    }

    fn input_level_db(&self) -> Option<f32> {
        self.options.metering_enabled.then(|| self.meter.level_db())
    }
}

struct FrameWriter {
    location: PathBuf,
    options: RecorderOptions,
    paused: Arc<AtomicBool>,
    meter: LevelMeter,
}

impl FrameWriter {
    async fn run(self, mut audio_rx: mpsc::Receiver<AudioFrame>) -> Result<u64> {
        let mut writer: Option<hound::WavWriter<BufWriter<File>>> = None;
        let mut samples_written = 0u64;

        while let Some(frame) = audio_rx.recv().await {
            if self.paused.load(Ordering::SeqCst) {
                continue;
            }

            if self.options.metering_enabled {
                self.meter.update(&frame.samples);
            }

            if writer.is_none() {
                writer = Some(create_writer(&self.location, frame.sample_rate, frame.channels)?);
            }

            if let Some(writer) = writer.as_mut() {
                for &sample in &frame.samples {
                    writer
                        .write_sample(sample)
                        .context("Failed to write sample to WAV")?;
                }
                samples_written += frame.samples.len() as u64;
            }
        }

        let writer = match writer {
            Some(writer) => writer,
            None => create_writer(&self.location, self.options.sample_rate, self.options.channels)?,
        };
        writer.finalize().context("Failed to finalize WAV file")?;

        Ok(samples_written)
    }
}

fn create_writer(
    path: &Path,
    sample_rate: u32,
    channels: u16,
) -> Result<hound::WavWriter<BufWriter<File>>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {:?}", path))
}
