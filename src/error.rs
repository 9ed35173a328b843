use std::path::PathBuf;

/// Errors surfaced by the recording session and the playback pipeline.
///
/// None of these are fatal: the component that returned one is left in a
/// state where the same operation can be retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Capture device or audio session could not be configured.
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Recorded audio could not be opened or decoded.
    #[error("Failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    /// The effects engine refused to start.
    #[error("Audio engine failed to start: {0}")]
    GraphStart(String),

    /// Operation is not valid in the current session state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Playback requested before an asset was prepared.
    #[error("No audio prepared for playback")]
    NotPrepared,

    /// Playback rate outside the supported range.
    #[error("Unsupported playback rate {0} (expected 0.5 to 2.0)")]
    InvalidRate(f32),

    /// Effect parameters outside the range the effect unit accepts.
    #[error("Invalid effect parameters: {0}")]
    InvalidEffect(String),
}

pub type Result<T> = std::result::Result<T, Error>;
