use std::path::PathBuf;

use super::device::RecorderOptions;
use crate::config::RecordingsConfig;

/// Configuration for a recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory new recordings are written to
    pub recordings_dir: PathBuf,

    /// Options passed to every recorder the session opens
    pub recorder: RecorderOptions,
}

impl SessionConfig {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            recorder: RecorderOptions::default(),
        }
    }
}

impl From<&RecordingsConfig> for SessionConfig {
    fn from(config: &RecordingsConfig) -> Self {
        Self {
            recordings_dir: config.resolved_path(),
            recorder: RecorderOptions {
                metering_enabled: config.metering,
                sample_rate: config.sample_rate,
                channels: config.channels,
            },
        }
    }
}
