use super::config::SessionConfig;
use super::device::{CaptureDevice, Recorder, SessionCategory};
use super::paths::RecordingPaths;
use super::state::{ControlState, SessionEvent, SessionState};
use crate::audio::AudioAsset;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Drives the capture device through one recording at a time.
///
/// `Idle → Recording ⇄ Paused → Finalizing → Finished | Failed`. The
/// finalize signal of each capture attempt is handled by a spawned task that
/// publishes exactly one [`SessionEvent`] and resets the controls.
pub struct RecordingSession {
    /// Session configuration
    config: SessionConfig,

    /// Capture device and audio session, owned by this session
    device: Arc<dyn CaptureDevice>,

    /// State machine plus the open recorder, if any
    inner: Arc<Mutex<Inner>>,

    /// Completion notifications
    events: broadcast::Sender<SessionEvent>,

    /// Externally visible control state
    controls: Arc<watch::Sender<ControlState>>,

    /// Handle for the task awaiting the finalize signal
    completion_task: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    state: SessionState,
    recorder: Option<Box<dyn Recorder>>,
    paused: bool,
    paths: RecordingPaths,
    attempt_id: Option<Uuid>,
}

impl RecordingSession {
    pub fn new(config: SessionConfig, device: Arc<dyn CaptureDevice>) -> Self {
        info!(
            "Creating recording session: {} (device: {})",
            config.recordings_dir.display(),
            device.name()
        );

        let (events, _) = broadcast::channel(16);
        let (controls, _) = watch::channel(ControlState::initial());

        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Idle,
                recorder: None,
                paused: false,
                paths: RecordingPaths::new(&config.recordings_dir),
                attempt_id: None,
            })),
            config,
            device,
            events,
            controls: Arc::new(controls),
            completion_task: Mutex::new(None),
        }
    }

    /// Start a new recording and return its destination.
    ///
    /// A capture that is still running is stopped first and its take is
    /// discarded. Fails with [`Error::DeviceUnavailable`] when the device
    /// cannot be configured or opened; the session is then `Failed` and no
    /// file is left at the destination.
    pub async fn start(&self) -> Result<PathBuf> {
        let mut inner = self.inner.lock().await;

        match inner.state {
            SessionState::Finalizing => {
                return Err(Error::InvalidState {
                    operation: "start recording",
                    state: "finalizing",
                });
            }
            SessionState::Recording | SessionState::Paused => {
                warn!("Recording already in progress, discarding it");
                Self::discard_active(&mut inner).await;
            }
            _ => {}
        }

        let attempt_id = Uuid::new_v4();
        info!("Starting recording (attempt {})", attempt_id);

        if let Err(e) = self.device.configure(SessionCategory::PlayAndRecord).await {
            return Err(self.fail_start(&mut inner, format!("Failed to configure audio session: {:#}", e)));
        }

        if let Err(e) = self.device.set_active(true).await {
            return Err(self.fail_start(&mut inner, format!("Failed to activate audio session: {:#}", e)));
        }

        let path = inner.paths.next();

        let mut recorder = match self
            .device
            .open_recorder(&path, &self.config.recorder)
            .await
        {
            Ok(recorder) => recorder,
            Err(e) => {
                return Err(self.fail_start(&mut inner, format!("Failed to open recorder: {:#}", e)));
            }
        };

        if let Err(e) = recorder.record().await {
            // Release the handle before reporting; its file is not a take
            if let Ok(signal) = recorder.finalize().await {
                let _ = signal.await;
            }
            drop(recorder);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => warn!("Failed to remove {}: {}", path.display(), err),
            }
            return Err(self.fail_start(&mut inner, format!("Failed to start capture: {:#}", e)));
        }

        inner.recorder = Some(recorder);
        inner.paused = false;
        inner.state = SessionState::Recording;
        inner.attempt_id = Some(attempt_id);
        self.controls.send_replace(ControlState::recording());

        info!("Recording to {} (attempt {})", path.display(), attempt_id);

        Ok(path)
    }

    /// Suspend capture without closing the file.
    pub async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if inner.state != SessionState::Recording {
            return Err(Error::InvalidState {
                operation: "pause",
                state: inner.state.name(),
            });
        }

        let recorder = inner.recorder.as_mut().ok_or(Error::InvalidState {
            operation: "pause",
            state: "without a recorder",
        })?;
        recorder
            .pause()
            .await
            .map_err(|e| Error::DeviceUnavailable(format!("Failed to pause capture: {:#}", e)))?;

        inner.paused = true;
        inner.state = SessionState::Paused;
        self.controls.send_replace(ControlState::paused());
        info!("Recording paused");

        Ok(())
    }

    /// Resume a paused capture.
    pub async fn resume(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if inner.state != SessionState::Paused {
            return Err(Error::InvalidState {
                operation: "resume",
                state: inner.state.name(),
            });
        }

        let recorder = inner.recorder.as_mut().ok_or(Error::InvalidState {
            operation: "resume",
            state: "without a recorder",
        })?;
        recorder
            .record()
            .await
            .map_err(|e| Error::DeviceUnavailable(format!("Failed to resume capture: {:#}", e)))?;

        inner.paused = false;
        inner.state = SessionState::Recording;
        self.controls.send_replace(ControlState::recording());
        info!("Recording resumed");

        Ok(())
    }

    /// Pause when recording, resume when paused.
    pub async fn toggle_pause(&self) -> Result<()> {
        let paused = self.inner.lock().await.paused;
        if paused {
            self.resume().await
        } else {
            self.pause().await
        }
    }

    /// Request the end of the current capture.
    ///
    /// Returns once finalization has been requested. The outcome arrives as
    /// a [`SessionEvent`]; use [`wait_for_completion`](Self::wait_for_completion)
    /// to await it directly.
    pub async fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if !inner.state.is_capturing() {
            return Err(Error::InvalidState {
                operation: "stop",
                state: inner.state.name(),
            });
        }

        info!("Stopping recording");

        if let Err(e) = self.device.set_active(false).await {
            warn!("Failed to deactivate audio session: {:#}", e);
        }

        let recorder = inner.recorder.take();
        inner.state = SessionState::Finalizing;

        let (location, signal, recorder) = match recorder {
            Some(mut recorder) => {
                let location = recorder.location().to_path_buf();
                let signal = match recorder.finalize().await {
                    Ok(signal) => Some(signal),
                    Err(e) => {
                        error!("Failed to finalize recorder: {:#}", e);
                        None
                    }
                };
                (Some(location), signal, Some(recorder))
            }
            None => (None, None, None),
        };

        let task = tokio::spawn(Self::await_completion(
            Arc::clone(&self.inner),
            self.events.clone(),
            Arc::clone(&self.controls),
            location,
            signal,
            recorder,
        ));

        *self.completion_task.lock().await = Some(task);

        Ok(())
    }

    /// Wait for the pending finalize signal, if any, and return the
    /// resulting state.
    pub async fn wait_for_completion(&self) -> SessionState {
        let task = self.completion_task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Completion task panicked: {}", e);
            }
        }
        self.state().await
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn is_paused(&self) -> bool {
        self.inner.lock().await.paused
    }

    /// Input level of the open recorder, in dBFS.
    pub async fn input_level_db(&self) -> Option<f32> {
        let inner = self.inner.lock().await;
        inner.recorder.as_ref().and_then(|r| r.input_level_db())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn controls(&self) -> watch::Receiver<ControlState> {
        self.controls.subscribe()
    }

    pub fn recordings_dir(&self) -> &std::path::Path {
        &self.config.recordings_dir
    }

    async fn await_completion(
        inner: Arc<Mutex<Inner>>,
        events: broadcast::Sender<SessionEvent>,
        controls: Arc<watch::Sender<ControlState>>,
        location: Option<PathBuf>,
        signal: Option<oneshot::Receiver<bool>>,
        recorder: Option<Box<dyn Recorder>>,
    ) {
        let success = match signal {
            Some(signal) => signal.await.unwrap_or_else(|_| {
                error!("Recorder dropped its finalize signal");
                false
            }),
            None => false,
        };

        // The capture handle is released once the file is final
        drop(recorder);

        let mut inner = inner.lock().await;
        let attempt_id = inner.attempt_id.take();

        let event = match (success, location) {
            (true, Some(location)) => {
                let asset = AudioAsset::from_location(location);
                info!(
                    "Recording finished: {} (attempt {:?})",
                    asset.title(),
                    attempt_id
                );
                inner.state = SessionState::Finished {
                    asset: asset.clone(),
                };
                SessionEvent::Finished(asset)
            }
            _ => {
                let reason = "audio recording failed".to_string();
                error!("Recording failed (attempt {:?})", attempt_id);
                inner.state = SessionState::Failed {
                    reason: reason.clone(),
                };
                SessionEvent::Failed { reason }
            }
        };

        inner.paused = false;
        controls.send_replace(ControlState::initial());

        // No subscribers is fine; the state carries the outcome too
        let _ = events.send(event);
    }

    async fn discard_active(inner: &mut Inner) {
        if let Some(mut recorder) = inner.recorder.take() {
            info!("Discarding capture at {}", recorder.location().display());
            match recorder.finalize().await {
                Ok(signal) => {
                    if !signal.await.unwrap_or(false) {
                        warn!("Discarded capture did not finalize cleanly");
                    }
                }
                Err(e) => warn!("Failed to finalize discarded capture: {:#}", e),
            }
        }
        inner.paused = false;
        inner.attempt_id = None;
        inner.state = SessionState::Idle;
    }

    fn fail_start(&self, inner: &mut Inner, reason: String) -> Error {
        error!("{}", reason);
        inner.recorder = None;
        inner.paused = false;
        inner.attempt_id = None;
        inner.state = SessionState::Failed {
            reason: reason.clone(),
        };
        self.controls.send_replace(ControlState::initial());
        Error::DeviceUnavailable(reason)
    }
}
