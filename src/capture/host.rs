use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::frame::Frame;
use super::source::FrameSource;
use crate::error::CaptureError;

/// Delegates capture to a privileged host endpoint that screenshots the visible tab
pub struct HostCaptureSource {
    url: String,
    http: Client,
}

impl HostCaptureSource {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build host capture client")?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl FrameSource for HostCaptureSource {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CaptureError::Host(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CaptureError::Host(format!(
                "capture endpoint returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CaptureError::Host(e.to_string()))?;

        let frame = Frame::decode(bytes.to_vec())?;
        debug!(
            "Host capture {}x{} ({} bytes)",
            frame.size().width,
            frame.size().height,
            frame.data().len()
        );

        Ok(frame)
    }

    fn name(&self) -> &str {
        "host capture endpoint"
    }
}
