use serde::Serialize;

use crate::audio::AudioAsset;

pub const TEXT_BEFORE_RECORDING: &str = "Tap to Record";
pub const TEXT_ON_RECORDING: &str = "Recording in Progress...";

/// Lifecycle of a recording session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Recording,
    Paused,
    /// Stop requested, waiting for the recorder's finalize signal
    Finalizing,
    Finished { asset: AudioAsset },
    Failed { reason: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Finalizing => "finalizing",
            Self::Finished { .. } => "finished",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }

    pub fn asset(&self) -> Option<&AudioAsset> {
        match self {
            Self::Finished { asset } => Some(asset),
            _ => None,
        }
    }
}

/// Published once per capture attempt that reached `stop()`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Finished(AudioAsset),
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseResumeLabel {
    Pause,
    Resume,
}

/// What the recording controls should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub record_enabled: bool,
    pub stop_visible: bool,
    pub pause_resume_visible: bool,
    pub pause_resume: PauseResumeLabel,
    pub status_text: String,
}

impl ControlState {
    pub fn initial() -> Self {
        Self {
            record_enabled: true,
            stop_visible: false,
            pause_resume_visible: false,
            pause_resume: PauseResumeLabel::Pause,
            status_text: TEXT_BEFORE_RECORDING.to_string(),
        }
    }

    pub fn recording() -> Self {
        Self {
            record_enabled: false,
            stop_visible: true,
            pause_resume_visible: true,
            pause_resume: PauseResumeLabel::Pause,
            status_text: TEXT_ON_RECORDING.to_string(),
        }
    }

    pub fn paused() -> Self {
        Self {
            pause_resume: PauseResumeLabel::Resume,
            ..Self::recording()
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::initial()
    }
}
