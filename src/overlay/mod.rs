pub mod palette;
pub mod renderer;
pub mod surface;

pub use palette::{Color, EmotionPalette};
pub use renderer::{scale_region, OverlayRenderer};
pub use surface::{
    AnnotationLayer, Annotation, OverlaySnapshot, OverlaySummary, OverlaySurface, ScreenRect,
};
