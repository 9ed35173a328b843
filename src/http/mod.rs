//! HTTP API server for remote control of recording and playback
//!
//! This module exposes the recording session and playback transport:
//! - POST /record/start, /record/pause, /record/resume, /record/stop
//! - GET /record/status - Session state and control state
//! - POST /playback/play - Play the last take with a preset
//! - POST /playback/stop - Silence playback
//! - GET /playback/status - Prepared take, position and live graph
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::{
    ErrorResponse, PlayRequest, PlaybackStatusResponse, RecordStatusResponse,
    StartRecordingResponse,
};
pub use routes::create_router;
pub use state::AppState;
