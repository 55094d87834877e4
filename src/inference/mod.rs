//! Emotion inference
//!
//! - `Classifier`: one classification capability (remote backend or local model)
//! - `InferenceClient`: retry/backoff, per-attempt timeout and cancellation around a classifier
//! - `CancelToken`: cooperative cancellation shared by every suspension point

pub mod cancel;
pub mod classifier;
pub mod client;
pub mod model;
pub mod remote;

pub use cancel::CancelToken;
pub use classifier::Classifier;
pub use client::{InferenceClient, RetryPolicy, SequenceGuard};
pub use model::{DetectionResult, FaceDetection, Region};
pub use remote::{AnalyzeRequest, FaceAnalysis, RemoteClassifier, WireRegion};
