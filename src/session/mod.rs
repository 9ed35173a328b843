//! Recording session management
//!
//! This module provides the `RecordingSession` state machine that manages:
//! - Capture device configuration and the single open recorder
//! - Pause / resume of the running capture
//! - Timestamped, collision-free destination paths
//! - Completion events and the control state shown to the user

mod config;
mod device;
mod paths;
mod session;
mod state;

pub use config::SessionConfig;
pub use device::{CaptureDevice, Recorder, RecorderOptions, SessionCategory};
pub use paths::{recording_file_name, RecordingPaths, RECORDING_NAME_FORMAT};
pub use session::RecordingSession;
pub use state::{
    ControlState, PauseResumeLabel, SessionEvent, SessionState, TEXT_BEFORE_RECORDING,
    TEXT_ON_RECORDING,
};
