use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::audio::{AudioBackendConfig, AudioSource};
use crate::playback::ReverbPreset;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recordings: RecordingsConfig,
    pub effects: EffectsConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingsConfig {
    /// Directory for new recordings; `~` is expanded
    pub path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub metering: bool,
    /// WAV file replayed as the capture input; a tone is used when unset
    pub input: Option<String>,
    pub tone_hz: f32,
}

impl RecordingsConfig {
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).into_owned())
    }

    /// Capture input: the configured WAV file, or the test tone.
    pub fn source(&self) -> AudioSource {
        match &self.input {
            Some(input) => AudioSource::File(PathBuf::from(shellexpand::tilde(input).into_owned())),
            None => AudioSource::Tone {
                frequency_hz: self.tone_hz,
            },
        }
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            ..AudioBackendConfig::default()
        }
    }
}

impl Default for RecordingsConfig {
    fn default() -> Self {
        Self {
            path: "~/.pitch-perfect/recordings".to_string(),
            sample_rate: 44100,
            channels: 1,
            metering: true,
            input: None,
            tone_hz: 440.0,
        }
    }
}

/// Parameters behind the playback presets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub slow_rate: f32,
    pub fast_rate: f32,
    pub chipmunk_cents: f32,
    pub darth_vader_cents: f32,
    pub reverb_preset: ReverbPreset,
    pub reverb_wet_dry_mix: f32,
    pub echo_delay_secs: f32,
    pub echo_feedback: f32,
    pub echo_wet_dry_mix: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            slow_rate: 0.5,
            fast_rate: 1.5,
            chipmunk_cents: 1000.0,
            darth_vader_cents: -1000.0,
            reverb_preset: ReverbPreset::LargeHall,
            reverb_wet_dry_mix: 50.0,
            echo_delay_secs: 0.5,
            echo_feedback: 60.0,
            echo_wet_dry_mix: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8230,
        }
    }
}

impl Config {
    /// Load `path` (extension optional); missing files fall back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("PITCH_PERFECT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
