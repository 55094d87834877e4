use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::palette::Color;
use crate::capture::FrameSize;

/// Rectangle in viewport (screen) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One drawn face annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub rect: ScreenRect,
    pub emotion: String,
    pub color: Color,
    /// Top score in [0, 100], drawn as the confidence bar fill
    pub confidence: f32,
    pub label: String,
}

/// Per-emotion face counts for the current frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlaySummary {
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
}

/// Drawing target for annotations
///
/// Implementations own the actual pixels (canvas, DOM, native window); the
/// renderer only needs the viewport size and clear/draw primitives.
pub trait OverlaySurface: Send + Sync {
    /// Current viewport size, re-read on every render
    fn viewport(&self) -> FrameSize;

    /// Remove every annotation and the summary
    fn clear(&self);

    /// Swap in a complete frame of annotations; readers never see a partial frame
    fn replace(&self, annotations: Vec<Annotation>, summary: Option<OverlaySummary>);
}

/// Serializable view of everything currently drawn
#[derive(Debug, Clone, Serialize)]
pub struct OverlaySnapshot {
    pub viewport: FrameSize,
    pub annotations: Vec<Annotation>,
    pub summary: Option<OverlaySummary>,
}

#[derive(Debug)]
struct LayerState {
    viewport: FrameSize,
    annotations: Vec<Annotation>,
    summary: Option<OverlaySummary>,
}

/// In-memory overlay surface; the page polls its snapshot and paints it
#[derive(Debug)]
pub struct AnnotationLayer {
    state: Mutex<LayerState>,
}

impl AnnotationLayer {
    pub fn new(viewport: FrameSize) -> Self {
        Self {
            state: Mutex::new(LayerState {
                viewport,
                annotations: Vec::new(),
                summary: None,
            }),
        }
    }

    /// Record a viewport resize reported by the page
    pub fn set_viewport(&self, viewport: FrameSize) {
        self.lock().viewport = viewport;
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        let state = self.lock();
        OverlaySnapshot {
            viewport: state.viewport,
            annotations: state.annotations.clone(),
            summary: state.summary.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.annotations.is_empty() && state.summary.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, LayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OverlaySurface for AnnotationLayer {
    fn viewport(&self) -> FrameSize {
        self.lock().viewport
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.annotations.clear();
        state.summary = None;
    }

    fn replace(&self, annotations: Vec<Annotation>, summary: Option<OverlaySummary>) {
        let mut state = self.lock();
        state.annotations = annotations;
        state.summary = summary;
    }
}
