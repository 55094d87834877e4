use async_trait::async_trait;

use super::model::DetectionResult;
use crate::capture::Frame;
use crate::error::{InferenceError, InitializationError};

/// Emotion classification capability
///
/// Implementations:
/// - Remote: HTTP inference backend (`POST /analyze_screen`)
/// - Local: an in-process model plugged in by the embedding application
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Check the capability is usable (backend liveness, local model bootstrap)
    async fn probe(&self) -> Result<(), InitializationError>;

    /// Classify every face in one frame (single attempt, no retry)
    async fn classify(&self, frame: &Frame) -> Result<DetectionResult, InferenceError>;

    /// Get classifier name for logging and status
    fn name(&self) -> &str;

    /// Endpoint the classifier talks to, if any
    fn endpoint(&self) -> Option<String> {
        None
    }

    /// Point the classifier at a different endpoint
    fn set_endpoint(&self, url: &str) -> Result<(), InitializationError> {
        Err(InitializationError::InvalidEndpoint(format!(
            "{} has no configurable endpoint (got {})",
            self.name(),
            url
        )))
    }
}
