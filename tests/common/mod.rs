// Shared test doubles for the integration tests
//
// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use anyhow::{bail, Result};
use pitch_perfect::audio::DecodedAudio;
use pitch_perfect::playback::{AudioEngine, AudioGraph, HeadlessEngine, NodeId, NodeKind};
use pitch_perfect::session::{CaptureDevice, Recorder, RecorderOptions, SessionCategory};
use std::f32::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Write a mono 16-bit sine WAV fixture.
pub fn write_wav(path: &Path, seconds: f32, sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let count = (seconds * sample_rate as f32) as u32;
    for n in 0..count {
        let t = n as f32 / sample_rate as f32;
        writer.write_sample(((TAU * 440.0 * t).sin() * 8000.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

// ============================================================================
// Capture device
// ============================================================================

/// What the mock device and its recorders were asked to do.
#[derive(Default)]
pub struct DeviceLog {
    pub categories: Mutex<Vec<SessionCategory>>,
    pub activations: Mutex<Vec<bool>>,
    pub opened: Mutex<Vec<PathBuf>>,
    pub finalized: Mutex<Vec<PathBuf>>,
    pub pauses: AtomicUsize,
    pub records: AtomicUsize,
}

/// Capture device with switchable failures.
///
/// Recorders write a short WAV on a successful finalize. With
/// `hold_finalize` set, finalize signals are parked until [`release`] is
/// called.
///
/// [`release`]: MockCaptureDevice::release
pub struct MockCaptureDevice {
    pub fail_configure: AtomicBool,
    pub fail_activate: AtomicBool,
    pub fail_open: AtomicBool,
    pub fail_record: AtomicBool,
    pub finalize_ok: Arc<AtomicBool>,
    pub hold_finalize: Arc<AtomicBool>,
    pub held: Arc<Mutex<Vec<oneshot::Sender<bool>>>>,
    pub log: Arc<DeviceLog>,
}

impl MockCaptureDevice {
    pub fn new() -> Self {
        Self {
            fail_configure: AtomicBool::new(false),
            fail_activate: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            fail_record: AtomicBool::new(false),
            finalize_ok: Arc::new(AtomicBool::new(true)),
            hold_finalize: Arc::new(AtomicBool::new(false)),
            held: Arc::new(Mutex::new(Vec::new())),
            log: Arc::new(DeviceLog::default()),
        }
    }

    /// Deliver every parked finalize signal.
    pub fn release(&self, success: bool) {
        for signal in self.held.lock().unwrap().drain(..) {
            let _ = signal.send(success);
        }
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.log.opened.lock().unwrap().clone()
    }

    pub fn finalized(&self) -> Vec<PathBuf> {
        self.log.finalized.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CaptureDevice for MockCaptureDevice {
    async fn configure(&self, category: SessionCategory) -> Result<()> {
        if self.fail_configure.load(Ordering::SeqCst) {
            bail!("audio session refused category {:?}", category);
        }
        self.log.categories.lock().unwrap().push(category);
        Ok(())
    }

    async fn set_active(&self, active: bool) -> Result<()> {
        if active && self.fail_activate.load(Ordering::SeqCst) {
            bail!("audio session is in use by another app");
        }
        self.log.activations.lock().unwrap().push(active);
        Ok(())
    }

    async fn open_recorder(
        &self,
        path: &Path,
        _options: &RecorderOptions,
    ) -> Result<Box<dyn Recorder>> {
        if self.fail_open.load(Ordering::SeqCst) {
            bail!("no input available");
        }
        self.log.opened.lock().unwrap().push(path.to_path_buf());
        Ok(Box::new(MockRecorder {
            location: path.to_path_buf(),
            fail_record: self.fail_record.load(Ordering::SeqCst),
            finalize_ok: Arc::clone(&self.finalize_ok),
            hold_finalize: Arc::clone(&self.hold_finalize),
            held: Arc::clone(&self.held),
            log: Arc::clone(&self.log),
            capturing: false,
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct MockRecorder {
    location: PathBuf,
    fail_record: bool,
    finalize_ok: Arc<AtomicBool>,
    hold_finalize: Arc<AtomicBool>,
    held: Arc<Mutex<Vec<oneshot::Sender<bool>>>>,
    log: Arc<DeviceLog>,
    capturing: bool,
}

#[async_trait::async_trait]
impl Recorder for MockRecorder {
    fn location(&self) -> &Path {
        &self.location
    }

    async fn record(&mut self) -> Result<()> {
        if self.fail_record {
            bail!("input busy");
        }
        self.capturing = true;
        self.log.records.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.capturing = false;
        self.log.pauses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finalize(&mut self) -> Result<oneshot::Receiver<bool>> {
        self.capturing = false;
        self.log.finalized.lock().unwrap().push(self.location.clone());

        let success = self.finalize_ok.load(Ordering::SeqCst);
        if success {
            write_wav(&self.location, 0.25, 8000)?;
        }

        let (tx, rx) = oneshot::channel();
        if self.hold_finalize.load(Ordering::SeqCst) {
            self.held.lock().unwrap().push(tx);
        } else {
            let _ = tx.send(success);
        }
        Ok(rx)
    }

    fn input_level_db(&self) -> Option<f32> {
        self.capturing.then_some(-20.0)
    }
}

// ============================================================================
// Effects engine
// ============================================================================

/// Headless engine whose start can be made to fail.
pub struct FlakyEngine {
    inner: HeadlessEngine,
    pub fail_start: Arc<AtomicBool>,
}

impl FlakyEngine {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let fail_start = Arc::new(AtomicBool::new(true));
        (
            Self {
                inner: HeadlessEngine::new(),
                fail_start: Arc::clone(&fail_start),
            },
            fail_start,
        )
    }
}

impl AudioEngine for FlakyEngine {
    fn attach(&mut self, kind: NodeKind) -> NodeId {
        self.inner.attach(kind)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.inner.connect(from, to)
    }

    fn output_node(&self) -> NodeId {
        self.inner.output_node()
    }

    fn schedule_file(&mut self, player: NodeId, audio: Arc<DecodedAudio>) -> Result<()> {
        self.inner.schedule_file(player, audio)
    }

    fn start(&mut self) -> Result<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            bail!("output device went away");
        }
        self.inner.start()
    }

    fn play(&mut self, player: NodeId) -> Result<()> {
        self.inner.play(player)
    }

    fn stop(&mut self) {
        self.inner.stop()
    }

    fn reset(&mut self) {
        self.inner.reset()
    }

    fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    fn graph(&self) -> &AudioGraph {
        self.inner.graph()
    }
}
