use async_trait::async_trait;
use tokio::sync::watch;

use super::frame::Frame;
use super::source::FrameSource;
use crate::error::CaptureError;

/// Producer side of a live stream: the page publishes the frames it samples
#[derive(Clone)]
pub struct StreamFeed {
    tx: watch::Sender<Option<Frame>>,
}

impl StreamFeed {
    /// Replace the latest frame; older unsampled frames are dropped
    pub fn publish(&self, frame: Frame) {
        self.tx.send_replace(Some(frame));
    }
}

/// Samples the most recent frame of a live stream
pub struct StreamSource {
    rx: watch::Receiver<Option<Frame>>,
}

impl StreamSource {
    /// Create a connected feed/source pair
    pub fn channel() -> (StreamFeed, StreamSource) {
        let (tx, rx) = watch::channel(None);
        (StreamFeed { tx }, StreamSource { rx })
    }
}

#[async_trait]
impl FrameSource for StreamSource {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let latest = self.rx.borrow().clone();

        match latest {
            Some(frame) => Ok(frame),
            None if self.rx.has_changed().is_err() => Err(CaptureError::StreamEnded),
            None => Err(CaptureError::NoFrameAvailable),
        }
    }

    fn name(&self) -> &str {
        "live stream"
    }
}
