use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

use super::classifier::Classifier;
use super::model::{DetectionResult, FaceDetection, Region};
use crate::capture::Frame;
use crate::error::{InferenceError, InitializationError};

// ============================================================================
// Wire types
// ============================================================================

/// Body of `POST /analyze_screen`
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Data-URL encoded image
    pub frame: String,
}

/// One face in the `/analyze_screen` response array
#[derive(Debug, Serialize, Deserialize)]
pub struct FaceAnalysis {
    #[serde(default)]
    pub dominant_emotion: String,
    pub emotion_scores: BTreeMap<String, f32>,
    pub region: WireRegion,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WireRegion {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl From<FaceAnalysis> for FaceDetection {
    fn from(face: FaceAnalysis) -> Self {
        let region = Region::new(face.region.x, face.region.y, face.region.w, face.region.h);
        FaceDetection::with_dominant(region, face.emotion_scores, face.dominant_emotion)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Remote inference backend reached over HTTP
pub struct RemoteClassifier {
    base_url: RwLock<String>,
    http: Client,
    health_timeout: Duration,
}

impl RemoteClassifier {
    pub fn new(base_url: &str, health_timeout: Duration) -> Result<Self, InitializationError> {
        let http = Client::builder()
            .build()
            .map_err(|e| InitializationError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            base_url: RwLock::new(normalize_url(base_url)?),
            http,
            health_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        let base = self
            .base_url
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        format!("{}{}", base, path)
    }
}

#[async_trait]
impl Classifier for RemoteClassifier {
    async fn probe(&self) -> Result<(), InitializationError> {
        let url = self.url("/health");
        debug!("Probing inference backend at {}", url);

        let response = self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| InitializationError::BackendUnavailable(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(InitializationError::BackendUnavailable(format!(
                "health check returned {}",
                response.status()
            )));
        }

        info!("Inference backend available at {}", url);
        Ok(())
    }

    async fn classify(&self, frame: &Frame) -> Result<DetectionResult, InferenceError> {
        let request = AnalyzeRequest {
            frame: frame.to_data_url(),
        };

        let response = self
            .http
            .post(self.url("/analyze_screen"))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(InferenceError::Backend(status.as_u16()));
        }

        let faces: Vec<FaceAnalysis> = response.json().await?;
        debug!("Backend returned {} face(s)", faces.len());

        Ok(faces.into_iter().map(FaceDetection::from).collect())
    }

    fn name(&self) -> &str {
        "remote backend"
    }

    fn endpoint(&self) -> Option<String> {
        Some(self.url(""))
    }

    fn set_endpoint(&self, url: &str) -> Result<(), InitializationError> {
        let url = normalize_url(url)?;
        info!("Inference backend set to {}", url);

        let mut base = self
            .base_url
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *base = url;
        Ok(())
    }
}

fn normalize_url(url: &str) -> Result<String, InitializationError> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(InitializationError::InvalidEndpoint(url.to_string()));
    }
    Ok(url.to_string())
}
