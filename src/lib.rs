pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod playback;
pub mod session;

pub use audio::{
    AudioAsset, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame,
    AudioSource, DecodedAudio, WavCaptureDevice,
};
pub use config::Config;
pub use error::{Error, Result};
pub use http::{create_router, AppState};
pub use playback::{
    EffectPipeline, EffectSpec, HeadlessEngine, HeadlessPlayerFactory, PlaybackPreset,
    PlaybackTransport, ReverbPreset,
};
pub use session::{ControlState, RecordingSession, SessionConfig, SessionEvent, SessionState};
