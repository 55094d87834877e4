//! HTTP API server for the page script
//!
//! This module provides a REST API for controlling detection:
//! - POST /command - Command envelope (`ping`, `startDetection`, ...)
//! - POST /detection/start, POST /detection/stop - Session control
//! - GET /detection/status - Session status and statistics
//! - PUT /detection/backend - Point at another inference backend
//! - GET /overlay, PUT /overlay/viewport - Overlay snapshot and resize
//! - POST /stream/frame - Push a frame in stream capture mode
//! - GET /health, GET /ping - Liveness

mod handlers;
mod routes;
mod state;

pub use handlers::{BackendRequest, ErrorResponse, FrameRequest, ViewportRequest};
pub use routes::create_router;
pub use state::AppState;
