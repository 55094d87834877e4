use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/ping", get(handlers::ping))
        // Command envelope used by the page script
        .route("/command", post(handlers::command))
        // Detection control
        .route("/detection/start", post(handlers::start_detection))
        .route("/detection/stop", post(handlers::stop_detection))
        .route("/detection/status", get(handlers::get_status))
        .route("/detection/backend", put(handlers::set_backend))
        // Overlay
        .route("/overlay", get(handlers::get_overlay))
        .route("/overlay/viewport", put(handlers::set_viewport))
        // Live stream ingest
        .route("/stream/frame", post(handlers::push_frame))
        // The page script calls in from another origin
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
