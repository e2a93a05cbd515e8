use super::handlers;
use super::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Message bus
        .route("/messages", post(handlers::dispatch))
        .route("/events", get(handlers::events))
        .route(
            "/surfaces/:surface_id/control",
            get(handlers::control_stream),
        )
        // Shortcuts for plain clients
        .route("/status", get(handlers::get_status))
        .route(
            "/history",
            get(handlers::get_history).delete(handlers::clear_history),
        )
        .route("/history/:id", delete(handlers::delete_recording))
        // Extension pages live on another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
