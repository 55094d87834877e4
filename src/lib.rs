pub mod capture;
pub mod command;
pub mod config;
pub mod error;
pub mod http;
pub mod inference;
pub mod overlay;
pub mod session;

pub use capture::{
    CaptureMode, Frame, FrameSize, FrameSource, FrameSourceFactory, ImageFormat, StreamFeed,
};
pub use command::{Command, CommandResponse};
pub use config::Config;
pub use error::{CaptureError, ControllerError, InferenceError, InitializationError};
pub use http::{create_router, AppState};
pub use inference::{
    CancelToken, Classifier, DetectionResult, FaceDetection, InferenceClient, Region,
    RemoteClassifier, RetryPolicy,
};
pub use overlay::{AnnotationLayer, EmotionPalette, OverlayRenderer, OverlaySurface};
pub use session::{DetectionController, DetectionStatus, SessionConfig, SessionState};
