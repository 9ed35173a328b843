use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::oneshot;

/// Audio session category requested before capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionCategory {
    Playback,
    Record,
    /// Capture while playback stays available
    PlayAndRecord,
}

impl SessionCategory {
    pub fn allows_recording(self) -> bool {
        matches!(self, Self::Record | Self::PlayAndRecord)
    }
}

/// Options handed to the device when a recorder is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderOptions {
    /// Track input level while capturing
    pub metering_enabled: bool,
    /// Format used when the device has to pick one itself
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            metering_enabled: true,
            sample_rate: 44100,
            channels: 1,
        }
    }
}

/// The capture device and its audio session.
///
/// Injected into [`RecordingSession`](super::RecordingSession) so that the
/// device's ownership and teardown order stay explicit.
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Set the audio session category
    async fn configure(&self, category: SessionCategory) -> Result<()>;

    /// Activate or deactivate the audio session
    async fn set_active(&self, active: bool) -> Result<()>;

    /// Open a recorder writing to `path`. Capture does not begin until
    /// [`Recorder::record`] is called.
    async fn open_recorder(&self, path: &Path, options: &RecorderOptions)
        -> Result<Box<dyn Recorder>>;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// A single open capture handle.
#[async_trait::async_trait]
pub trait Recorder: Send + Sync {
    /// Destination of the recording
    fn location(&self) -> &Path;

    /// Begin capture, or resume after [`pause`](Recorder::pause)
    async fn record(&mut self) -> Result<()>;

    /// Suspend capture without closing the file
    async fn pause(&mut self) -> Result<()>;

    /// Ask the recorder to finish writing.
    ///
    /// Returns immediately; the receiver resolves once, with `true` when the
    /// file was finalized successfully.
    async fn finalize(&mut self) -> Result<oneshot::Receiver<bool>>;

    /// Current input level in dBFS, when metering is enabled
    fn input_level_db(&self) -> Option<f32>;
}
