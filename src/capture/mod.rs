pub mod frame;
pub mod host;
pub mod snapshot;
pub mod source;
pub mod stream;

pub use frame::{Frame, FrameSize, ImageFormat};
pub use host::HostCaptureSource;
pub use snapshot::SnapshotSource;
pub use source::{CaptureHandles, CaptureMode, FrameSource, FrameSourceFactory};
pub use stream::{StreamFeed, StreamSource};
