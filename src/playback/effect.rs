use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Pitch shift range accepted by the time-pitch unit, in cents.
pub const PITCH_RANGE_CENTS: (f32, f32) = (-2400.0, 2400.0);

/// Longest echo the delay unit supports, in seconds.
pub const MAX_DELAY_SECS: f32 = 2.0;

/// The single effect placed between the player and the output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectSpec {
    /// Positive cents raise the pitch; 100 cents is one semitone
    PitchShift { cents: f32 },
    Reverb {
        preset: ReverbPreset,
        /// Percentage of processed signal, 0 to 100
        wet_dry_mix: f32,
    },
    Delay {
        delay_secs: f32,
        /// Percentage of output fed back into the delay line, -100 to 100
        feedback: f32,
        wet_dry_mix: f32,
    },
}

impl EffectSpec {
    /// Name of the effect unit these parameters configure.
    pub fn unit_name(&self) -> &'static str {
        match self {
            Self::PitchShift { .. } => "time_pitch",
            Self::Reverb { .. } => "reverb",
            Self::Delay { .. } => "delay",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::PitchShift { cents } => {
                let (min, max) = PITCH_RANGE_CENTS;
                if !(min..=max).contains(&cents) {
                    return Err(Error::InvalidEffect(format!(
                        "pitch shift of {} cents is outside {}..={}",
                        cents, min, max
                    )));
                }
            }
            Self::Reverb { wet_dry_mix, .. } => check_mix(wet_dry_mix)?,
            Self::Delay {
                delay_secs,
                feedback,
                wet_dry_mix,
            } => {
                if !(0.0..=MAX_DELAY_SECS).contains(&delay_secs) {
                    return Err(Error::InvalidEffect(format!(
                        "delay of {}s is outside 0..={}s",
                        delay_secs, MAX_DELAY_SECS
                    )));
                }
                if !(-100.0..=100.0).contains(&feedback) {
                    return Err(Error::InvalidEffect(format!(
                        "feedback of {}% is outside -100..=100",
                        feedback
                    )));
                }
                check_mix(wet_dry_mix)?;
            }
        }
        Ok(())
    }
}

fn check_mix(wet_dry_mix: f32) -> Result<()> {
    if !(0.0..=100.0).contains(&wet_dry_mix) {
        return Err(Error::InvalidEffect(format!(
            "wet/dry mix of {}% is outside 0..=100",
            wet_dry_mix
        )));
    }
    Ok(())
}

/// Factory presets of the reverb unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReverbPreset {
    SmallRoom,
    MediumRoom,
    LargeRoom,
    MediumHall,
    LargeHall,
    Plate,
    MediumChamber,
    LargeChamber,
    Cathedral,
    LargeRoom2,
    MediumHall2,
    MediumHall3,
    LargeHall2,
}

impl ReverbPreset {
    pub const ALL: [ReverbPreset; 13] = [
        Self::SmallRoom,
        Self::MediumRoom,
        Self::LargeRoom,
        Self::MediumHall,
        Self::LargeHall,
        Self::Plate,
        Self::MediumChamber,
        Self::LargeChamber,
        Self::Cathedral,
        Self::LargeRoom2,
        Self::MediumHall2,
        Self::MediumHall3,
        Self::LargeHall2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SmallRoom => "small-room",
            Self::MediumRoom => "medium-room",
            Self::LargeRoom => "large-room",
            Self::MediumHall => "medium-hall",
            Self::LargeHall => "large-hall",
            Self::Plate => "plate",
            Self::MediumChamber => "medium-chamber",
            Self::LargeChamber => "large-chamber",
            Self::Cathedral => "cathedral",
            Self::LargeRoom2 => "large-room2",
            Self::MediumHall2 => "medium-hall2",
            Self::MediumHall3 => "medium-hall3",
            Self::LargeHall2 => "large-hall2",
        }
    }
}

impl fmt::Display for ReverbPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReverbPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| Error::InvalidEffect(format!("unknown reverb preset '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chipmunk_and_darth_vader_are_valid() {
        assert!(EffectSpec::PitchShift { cents: 1000.0 }.validate().is_ok());
        assert!(EffectSpec::PitchShift { cents: -1000.0 }.validate().is_ok());
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        assert!(EffectSpec::PitchShift { cents: 3000.0 }.validate().is_err());
        assert!(EffectSpec::Reverb {
            preset: ReverbPreset::LargeHall,
            wet_dry_mix: 120.0
        }
        .validate()
        .is_err());
        assert!(EffectSpec::Delay {
            delay_secs: 3.0,
            feedback: 60.0,
            wet_dry_mix: 50.0
        }
        .validate()
        .is_err());
        assert!(EffectSpec::Delay {
            delay_secs: 0.5,
            feedback: 150.0,
            wet_dry_mix: 50.0
        }
        .validate()
        .is_err());
    }

    #[test]
    fn reverb_presets_parse_from_names() {
        for preset in ReverbPreset::ALL {
            assert_eq!(preset.name().parse::<ReverbPreset>().unwrap(), preset);
        }
        assert_eq!(
            "Large_Hall".parse::<ReverbPreset>().unwrap(),
            ReverbPreset::LargeHall
        );
        assert!("stadium".parse::<ReverbPreset>().is_err());
    }

    #[test]
    fn effect_spec_serializes_with_type_tag() {
        let json = serde_json::to_value(EffectSpec::Reverb {
            preset: ReverbPreset::LargeHall,
            wet_dry_mix: 50.0,
        })
        .unwrap();

        assert_eq!(json["type"], "reverb");
        assert_eq!(json["preset"], "large-hall");
    }
}
