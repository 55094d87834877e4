use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::frame::Frame;
use super::source::FrameSource;
use crate::error::CaptureError;

/// Reads the most recent screenshot the host helper wrote to disk
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl FrameSource for SnapshotSource {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let data = tokio::fs::read(&self.path).await?;
        let frame = Frame::decode(data)?;

        debug!(
            "Snapshot read from {} ({}x{}, {} bytes)",
            self.path.display(),
            frame.size().width,
            frame.size().height,
            frame.data().len()
        );

        Ok(frame)
    }

    fn name(&self) -> &str {
        "snapshot file"
    }
}
