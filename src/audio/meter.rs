use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub const METER_FLOOR_DB: f32 = -160.0;

/// Input level readout shared between a recorder and its writer task.
#[derive(Clone, Debug)]
pub struct LevelMeter {
    level_bits: Arc<AtomicU32>,
}

impl LevelMeter {
    pub fn new() -> Self {
        Self {
            level_bits: Arc::new(AtomicU32::new(METER_FLOOR_DB.to_bits())),
        }
    }

    pub fn update(&self, samples: &[i16]) {
        self.set_db(rms_db(samples));
    }

    pub fn set_db(&self, db: f32) {
        self.level_bits.store(db.to_bits(), Ordering::Relaxed);
    }

    pub fn level_db(&self) -> f32 {
        f32::from_bits(self.level_bits.load(Ordering::Relaxed))
    }

    pub fn reset(&self) {
        self.set_db(METER_FLOOR_DB);
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// RMS level of 16-bit PCM in dBFS, clamped to the meter floor.
pub fn rms_db(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return METER_FLOOR_DB;
    }
    let scale = i16::MAX as f32;
    let energy: f32 = samples
        .iter()
        .map(|&s| {
            let v = s as f32 / scale;
            v * v
        })
        .sum::<f32>()
        / samples.len() as f32;
    let rms = energy.sqrt();
    if rms <= 0.0 {
        return METER_FLOOR_DB;
    }
    (20.0 * rms.log10()).max(METER_FLOOR_DB)
}
