use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use super::effect::EffectSpec;
use super::pipeline::EffectPipeline;
use crate::audio::{AudioAsset, DecodedAudio};
use crate::config::EffectsConfig;
use crate::error::{Error, Result};

/// The playback buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackPreset {
    Slow,
    Fast,
    Chipmunk,
    DarthVader,
    Reverb,
    Echo,
}

impl PlaybackPreset {
    pub const ALL: [PlaybackPreset; 6] = [
        Self::Slow,
        Self::Fast,
        Self::Chipmunk,
        Self::DarthVader,
        Self::Reverb,
        Self::Echo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Fast => "fast",
            Self::Chipmunk => "chipmunk",
            Self::DarthVader => "darth-vader",
            Self::Reverb => "reverb",
            Self::Echo => "echo",
        }
    }
}

impl fmt::Display for PlaybackPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlaybackPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| Error::InvalidEffect(format!("unknown playback preset '{}'", s)))
    }
}

/// What a preset asks the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresetAction {
    Rate(f32),
    Effect(EffectSpec),
}

impl EffectsConfig {
    pub fn action(&self, preset: PlaybackPreset) -> PresetAction {
        match preset {
            PlaybackPreset::Slow => PresetAction::Rate(self.slow_rate),
            PlaybackPreset::Fast => PresetAction::Rate(self.fast_rate),
            PlaybackPreset::Chipmunk => PresetAction::Effect(EffectSpec::PitchShift {
                cents: self.chipmunk_cents,
            }),
            PlaybackPreset::DarthVader => PresetAction::Effect(EffectSpec::PitchShift {
                cents: self.darth_vader_cents,
            }),
            PlaybackPreset::Reverb => PresetAction::Effect(EffectSpec::Reverb {
                preset: self.reverb_preset,
                wet_dry_mix: self.reverb_wet_dry_mix,
            }),
            PlaybackPreset::Echo => PresetAction::Effect(EffectSpec::Delay {
                delay_secs: self.echo_delay_secs,
                feedback: self.echo_feedback,
                wet_dry_mix: self.echo_wet_dry_mix,
            }),
        }
    }
}

/// Playback controls over an [`EffectPipeline`].
pub struct PlaybackTransport {
    pipeline: EffectPipeline,
    effects: EffectsConfig,
}

impl PlaybackTransport {
    pub fn new(pipeline: EffectPipeline, effects: EffectsConfig) -> Self {
        Self { pipeline, effects }
    }

    /// Hand a finished recording to the playback side.
    pub fn load(&mut self, asset: &AudioAsset) -> Result<()> {
        self.pipeline.prepare_playback(asset)
    }

    /// Like [`load`](Self::load), with the decode already done.
    pub fn load_decoded(&mut self, asset: &AudioAsset, audio: DecodedAudio) -> Result<()> {
        self.pipeline.prepare_decoded(asset, audio)
    }

    pub fn play(&mut self, preset: PlaybackPreset) -> Result<()> {
        info!("Playback preset: {}", preset);
        match self.effects.action(preset) {
            PresetAction::Rate(rate) => self.pipeline.play_at_rate(rate),
            PresetAction::Effect(effect) => self.pipeline.play_with_effect(effect),
        }
    }

    pub fn stop_requested(&mut self) {
        self.pipeline.stop();
    }

    /// The playback context is going away; nothing may keep sounding.
    pub fn screen_leaving(&mut self) {
        if self.pipeline.is_playing() {
            info!("Leaving playback, stopping audio");
        }
        self.pipeline.stop();
    }

    pub fn pipeline(&self) -> &EffectPipeline {
        &self.pipeline
    }

    pub fn effects(&self) -> &EffectsConfig {
        &self.effects
    }
}
