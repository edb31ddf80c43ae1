use async_trait::async_trait;
use std::sync::Arc;

use crate::frame::VideoFrame;

/// Identity of a capture device as shown in logs and UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: String,
    pub label: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A video capture device. `connect` is the synchronous-looking setup call
/// the session wiring expects; it fails when the device cannot be opened
/// (missing, busy, or revoked permission).
pub trait VideoCaptureDevice: Send + Sync {
    fn descriptor(&self) -> DeviceDescriptor;
    fn connect(&self) -> anyhow::Result<Box<dyn FrameStream>>;
}

/// An open stream of frames from a connected device. `Ok(None)` means the
/// stream ended (finite sources, unplugged hardware that shut down cleanly);
/// `Err` means it failed mid-capture.
#[async_trait]
pub trait FrameStream: Send {
    async fn next_frame(&mut self) -> anyhow::Result<Option<VideoFrame>>;
}

/// Device discovery seam. Platform backends enumerate real hardware; the
/// synthetic registry offers a test-pattern device or nothing at all.
pub trait DeviceRegistry: Send + Sync {
    /// The device a scanner should use when the caller expressed no
    /// preference. `None` means no camera is available.
    fn default_video_device(&self) -> Option<Arc<dyn VideoCaptureDevice>>;
}
