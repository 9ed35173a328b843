use super::state::AppState;
use crate::audio::AudioAsset;
use crate::error::Error;
use crate::playback::{NodeKind, PlaybackPreset};
use crate::session::{ControlState, SessionState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StartRecordingResponse {
    pub status: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct RecordStatusResponse {
    pub session: SessionState,
    pub controls: ControlState,
    pub input_level_db: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub preset: PlaybackPreset,
}

#[derive(Debug, Serialize)]
pub struct PlaybackStatusResponse {
    pub asset: Option<AudioAsset>,
    pub playing: bool,
    pub position_secs: Option<f64>,
    pub graph: Vec<NodeKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::InvalidState { .. } | Error::NotPrepared => StatusCode::CONFLICT,
        Error::DeviceUnavailable(_) | Error::GraphStart(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::InvalidRate(_) | Error::InvalidEffect(_) => StatusCode::BAD_REQUEST,
        Error::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(context: &str, err: Error) -> Response {
    error!("{}: {}", context, err);
    (
        status_for(&err),
        Json(ErrorResponse {
            error: format!("{}: {}", context, err),
        }),
    )
        .into_response()
}

fn status_only(status: &str) -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": status })),
    )
        .into_response()
}

// ============================================================================
// Recording
// ============================================================================

/// POST /record/start
/// Silence playback and start a new take
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    state.transport.lock().await.screen_leaving();

    match state.session.start().await {
        Ok(location) => {
            info!("Recording started: {}", location.display());
            (
                StatusCode::OK,
                Json(StartRecordingResponse {
                    status: "recording".to_string(),
                    location: location.display().to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => error_response("Failed to start recording", e),
    }
}

/// POST /record/pause
pub async fn pause_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.pause().await {
        Ok(()) => status_only("paused"),
        Err(e) => error_response("Failed to pause recording", e),
    }
}

/// POST /record/resume
pub async fn resume_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.resume().await {
        Ok(()) => status_only("recording"),
        Err(e) => error_response("Failed to resume recording", e),
    }
}

/// POST /record/stop
/// Request the end of the take; the outcome shows up in /record/status
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.stop().await {
        Ok(()) => status_only("finalizing"),
        Err(e) => error_response("Failed to stop recording", e),
    }
}

/// GET /record/status
pub async fn get_record_status(State(state): State<AppState>) -> impl IntoResponse {
    let controls = state.session.controls().borrow().clone();
    let response = RecordStatusResponse {
        session: state.session.state().await,
        controls,
        input_level_db: state.session.input_level_db().await,
    };
    (StatusCode::OK, Json(response)).into_response()
}

// ============================================================================
// Playback
// ============================================================================

/// POST /playback/play
/// Play the last finished take with a named preset
pub async fn play(State(state): State<AppState>, Json(req): Json<PlayRequest>) -> impl IntoResponse {
    let mut transport = state.transport.lock().await;
    match transport.play(req.preset) {
        Ok(()) => status_only("playing"),
        Err(e) => error_response(&format!("Failed to play {}", req.preset), e),
    }
}

/// POST /playback/stop
pub async fn stop_playback(State(state): State<AppState>) -> impl IntoResponse {
    state.transport.lock().await.stop_requested();
    status_only("stopped")
}

/// GET /playback/status
pub async fn get_playback_status(State(state): State<AppState>) -> impl IntoResponse {
    let transport = state.transport.lock().await;
    let pipeline = transport.pipeline();
    let response = PlaybackStatusResponse {
        asset: pipeline.asset().cloned(),
        playing: pipeline.is_playing(),
        position_secs: pipeline.position().map(|p| p.as_secs_f64()),
        graph: pipeline.topology(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
