//! Camera capture pipeline: device discovery, a single-use capture session,
//! a metadata output that runs frames through a detection engine, and a
//! preview surface mirroring the live feed.
//!
//! Detection itself is behind the [`SymbologyEngine`] trait; this crate ships
//! a scripted engine and a synthetic test-pattern device so the pipeline can
//! run end to end without camera hardware.

mod device;
mod error;
mod frame;
mod metadata;
mod preview;
mod session;
pub mod synthetic;

pub use device::{DeviceDescriptor, DeviceRegistry, FrameStream, VideoCaptureDevice};
pub use error::CaptureError;
pub use frame::VideoFrame;
pub use metadata::{MachineReadableCode, MetadataObject, MetadataOutput, SymbologyEngine};
pub use preview::{CropRegion, PreviewSurface, SurfaceBounds, VideoGravity};
pub use session::{CaptureInput, CaptureSession, SessionEvent};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
