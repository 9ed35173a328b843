pub mod asset;
pub mod backend;
pub mod decode;
pub mod file;
pub mod meter;
pub mod recorder;

pub use asset::AudioAsset;
pub use backend::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource, FileBackend,
    ToneBackend,
};
pub use decode::DecodedAudio;
pub use file::AudioFile;
pub use meter::{rms_db, LevelMeter, METER_FLOOR_DB};
pub use recorder::{WavCaptureDevice, WavRecorder};
