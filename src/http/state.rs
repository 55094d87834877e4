use crate::capture::StreamFeed;
use crate::overlay::AnnotationLayer;
use crate::session::DetectionController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single detection session
    pub controller: Arc<DetectionController>,

    /// Overlay the page polls and paints
    pub layer: Arc<AnnotationLayer>,

    /// Frame ingest for stream capture mode
    pub feed: Option<StreamFeed>,
}

impl AppState {
    pub fn new(controller: Arc<DetectionController>, layer: Arc<AnnotationLayer>) -> Self {
        Self {
            controller,
            layer,
            feed: None,
        }
    }

    pub fn with_feed(mut self, feed: Option<StreamFeed>) -> Self {
        self.feed = feed;
        self
    }
}
