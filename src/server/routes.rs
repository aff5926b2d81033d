use super::handlers;
use super::socket;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the gateway router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Transcription session (duplex)
        .route("/stt", get(socket::stt_handler))
        // Diagnostics
        .route("/sessions", get(handlers::list_sessions))
        // Health check
        .route("/health", get(handlers::health_check))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
