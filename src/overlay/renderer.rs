use std::sync::Arc;
use tracing::debug;

use super::palette::EmotionPalette;
use super::surface::{Annotation, OverlaySummary, OverlaySurface, ScreenRect};
use crate::capture::FrameSize;
use crate::inference::{DetectionResult, FaceDetection, Region};

/// Map a capture-space region into viewport coordinates
///
/// Each axis is scaled by `viewport / capture` for that axis. A zero-sized
/// capture axis leaves the coordinate unscaled.
pub fn scale_region(region: &Region, capture: FrameSize, viewport: FrameSize) -> ScreenRect {
    let ratio = |view: u32, cap: u32| {
        if cap == 0 {
            1.0
        } else {
            view as f64 / cap as f64
        }
    };
    let sx = ratio(viewport.width, capture.width);
    let sy = ratio(viewport.height, capture.height);

    ScreenRect {
        x: region.x as f64 * sx,
        y: region.y as f64 * sy,
        width: region.width as f64 * sx,
        height: region.height as f64 * sy,
    }
}

/// Draws per-face emotion annotations onto an overlay surface
pub struct OverlayRenderer {
    surface: Arc<dyn OverlaySurface>,
    palette: EmotionPalette,
    min_confidence: f32,
}

impl OverlayRenderer {
    pub fn new(surface: Arc<dyn OverlaySurface>) -> Self {
        Self {
            surface,
            palette: EmotionPalette,
            min_confidence: 0.0,
        }
    }

    /// Hide faces whose top score is below `min_confidence` (0–100)
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Replace whatever is drawn with the annotations for `result`
    ///
    /// Returns the number of annotations drawn.
    pub fn render(&self, result: &DetectionResult, capture: FrameSize) -> usize {
        let viewport = self.surface.viewport();

        let mut annotations = Vec::with_capacity(result.len());
        let mut summary = OverlaySummary::default();
        for face in result {
            if face.confidence() < self.min_confidence {
                continue;
            }

            let annotation = self.annotate(face, capture, viewport);
            *summary.counts.entry(annotation.emotion.clone()).or_insert(0) += 1;
            summary.total += 1;
            annotations.push(annotation);
        }

        let drawn = summary.total;
        self.surface.replace(annotations, (drawn > 0).then_some(summary));

        debug!(
            "Rendered {} of {} face(s) at {}x{} -> {}x{}",
            drawn,
            result.len(),
            capture.width,
            capture.height,
            viewport.width,
            viewport.height
        );

        drawn
    }

    /// Remove every annotation
    pub fn clear(&self) {
        self.surface.clear();
    }

    fn annotate(&self, face: &FaceDetection, capture: FrameSize, viewport: FrameSize) -> Annotation {
        let confidence = face.confidence();
        Annotation {
            rect: scale_region(&face.region, capture, viewport),
            emotion: face.dominant_emotion.clone(),
            color: self.palette.color_for(&face.dominant_emotion),
            confidence,
            label: format!(
                "{} ({}%)",
                face.dominant_emotion.to_uppercase(),
                confidence.round() as i32
            ),
        }
    }
}
