use super::state::AppState;
use crate::capture::{Frame, FrameSize};
use crate::command::{Command, CommandResponse};
use crate::error::{ControllerError, InitializationError};
use crate::session::DetectionStatus;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BackendRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewportRequest {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    /// `data:image/...;base64,...`
    pub frame: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn controller_error(err: ControllerError) -> Response {
    let status = match &err {
        ControllerError::InvalidTransition { .. } => StatusCode::CONFLICT,
        ControllerError::Initialization(InitializationError::Aborted) => StatusCode::CONFLICT,
        ControllerError::Initialization(InitializationError::InvalidEndpoint(_)) => {
            StatusCode::BAD_REQUEST
        }
        ControllerError::Initialization(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, err)
}

fn status_result(result: Result<DetectionStatus, ControllerError>) -> Response {
    match result {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => controller_error(e),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /command
/// Dispatch a command envelope; failures are reported in the body
pub async fn command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Json<CommandResponse> {
    debug!("Command received: {:?}", command);
    Json(state.controller.handle(command).await)
}

/// POST /detection/start
/// Start the detection session
pub async fn start_detection(State(state): State<AppState>) -> Response {
    info!("Start requested");

    let result = state.controller.start().await;
    if let Err(e) = &result {
        error!("Failed to start detection: {}", e);
    }
    status_result(result)
}

/// POST /detection/stop
/// Stop the detection session and clear the overlay
pub async fn stop_detection(State(state): State<AppState>) -> Response {
    info!("Stop requested");
    status_result(state.controller.stop().await)
}

/// GET /detection/status
pub async fn get_status(State(state): State<AppState>) -> Json<DetectionStatus> {
    Json(state.controller.status())
}

/// PUT /detection/backend
/// Point the remote classifier at another backend (idle only)
pub async fn set_backend(
    State(state): State<AppState>,
    Json(req): Json<BackendRequest>,
) -> Response {
    info!("Backend change requested: {}", req.url);
    status_result(state.controller.set_backend_url(&req.url))
}

/// GET /overlay
/// Everything currently drawn on the overlay
pub async fn get_overlay(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.layer.snapshot())
}

/// PUT /overlay/viewport
/// Viewport size reported by the page after a resize
pub async fn set_viewport(
    State(state): State<AppState>,
    Json(req): Json<ViewportRequest>,
) -> Response {
    if req.width == 0 || req.height == 0 {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("invalid viewport {}x{}", req.width, req.height),
        );
    }

    debug!("Viewport resized to {}x{}", req.width, req.height);
    state
        .layer
        .set_viewport(FrameSize::new(req.width, req.height));

    (StatusCode::OK, Json(state.layer.snapshot())).into_response()
}

/// POST /stream/frame
/// Publish the latest frame of the live stream
pub async fn push_frame(
    State(state): State<AppState>,
    Json(req): Json<FrameRequest>,
) -> Response {
    let Some(feed) = &state.feed else {
        return error_response(
            StatusCode::CONFLICT,
            "frame ingest is only available in stream capture mode",
        );
    };

    match Frame::from_data_url(&req.frame) {
        Ok(frame) => {
            debug!(
                "Stream frame {}x{} received",
                frame.size().width,
                frame.size().height
            );
            feed.publish(frame);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!("Rejected stream frame: {}", e);
            error_response(StatusCode::BAD_REQUEST, e)
        }
    }
}

/// GET /ping
pub async fn ping() -> Json<CommandResponse> {
    Json(CommandResponse::pong())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
