use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control
        .route("/record/start", post(handlers::start_recording))
        .route("/record/pause", post(handlers::pause_recording))
        .route("/record/resume", post(handlers::resume_recording))
        .route("/record/stop", post(handlers::stop_recording))
        .route("/record/status", get(handlers::get_record_status))
        // Playback control
        .route("/playback/play", post(handlers::play))
        .route("/playback/stop", post(handlers::stop_playback))
        .route("/playback/status", get(handlers::get_playback_status))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
