use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::frame::Frame;
use super::host::HostCaptureSource;
use super::snapshot::SnapshotSource;
use super::stream::{StreamFeed, StreamSource};
use crate::error::CaptureError;

/// Frame acquisition trait
///
/// Implementations:
/// - Snapshot: latest screenshot file written by a privileged host helper
/// - Host: HTTP capture endpoint exposed by the host (tab screenshot capability)
/// - Stream: latest frame sampled from a live display-media stream
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Acquire one frame representing the current visual state
    async fn capture(&self) -> Result<Frame, CaptureError>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Capture strategy selected in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CaptureMode {
    /// Read the screenshot file at `path`
    Snapshot { path: PathBuf },
    /// Fetch a screenshot from the host capture endpoint
    Host { url: String },
    /// Sample frames pushed into the stream feed
    #[default]
    Stream,
}

/// A constructed frame source, plus the feed that drives it in stream mode
pub struct CaptureHandles {
    pub source: Arc<dyn FrameSource>,
    pub feed: Option<StreamFeed>,
}

/// Frame source factory
pub struct FrameSourceFactory;

impl FrameSourceFactory {
    /// Create the frame source for the configured capture mode
    pub fn create(mode: &CaptureMode) -> anyhow::Result<CaptureHandles> {
        let handles = match mode {
            CaptureMode::Snapshot { path } => CaptureHandles {
                source: Arc::new(SnapshotSource::new(path.clone())),
                feed: None,
            },
            CaptureMode::Host { url } => CaptureHandles {
                source: Arc::new(HostCaptureSource::new(url)?),
                feed: None,
            },
            CaptureMode::Stream => {
                let (feed, source) = StreamSource::channel();
                CaptureHandles {
                    source: Arc::new(source),
                    feed: Some(feed),
                }
            }
        };

        info!("Frame source ready: {}", handles.source.name());

        Ok(handles)
    }
}
