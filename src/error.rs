use thiserror::Error;

use crate::session::SessionState;

/// Frame acquisition failures
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read capture: {0}")]
    Io(#[from] std::io::Error),

    #[error("host capture request failed: {0}")]
    Host(String),

    #[error("could not decode captured image: {0}")]
    Decode(String),

    #[error("captured frame is empty")]
    EmptyFrame,

    #[error("no frame has been published to the stream yet")]
    NoFrameAvailable,

    #[error("capture stream ended")]
    StreamEnded,

    #[error("capture cancelled")]
    Cancelled,
}

/// Failures of a single `InferenceClient::submit` call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("attempt timed out after {0} ms")]
    Timeout(u64),

    #[error("backend returned status {0}")]
    Backend(u16),

    #[error("malformed backend response: {0}")]
    Malformed(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request superseded by a newer one")]
    Outdated,
}

impl InferenceError {
    /// Only transport-level failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, InferenceError::Network(_) | InferenceError::Timeout(_))
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            InferenceError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            InferenceError::Backend(status.as_u16())
        } else {
            InferenceError::Network(err.to_string())
        }
    }
}

/// Classifier selection failed during `start()`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitializationError {
    #[error("inference backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("local model bootstrap failed: {0}")]
    LocalModel(String),

    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("start aborted by stop request")]
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error(transparent)]
    Initialization(#[from] InitializationError),
}
