use tokio::sync::watch;

use crate::frame::VideoFrame;
use crate::session::CaptureSession;

/// Pixel bounds of the on-screen area a preview surface fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceBounds {
    pub width: u32,
    pub height: u32,
}

impl SurfaceBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// How the camera feed maps onto the surface bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoGravity {
    /// Scale to cover the bounds, cropping overflow.
    #[default]
    ResizeAspectFill,
    /// Scale to fit inside the bounds, letterboxing.
    ResizeAspect,
}

/// Normalized sub-rectangle of a frame that should be drawn, in `0.0..=1.0`
/// texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub u_min: f32,
    pub v_min: f32,
    pub u_max: f32,
    pub v_max: f32,
}

impl CropRegion {
    const FULL: CropRegion = CropRegion {
        u_min: 0.0,
        v_min: 0.0,
        u_max: 1.0,
        v_max: 1.0,
    };
}

/// Live visual rendering of the camera feed: a latest-frame subscription plus
/// the mutable bounds of the view area it fills. Renderers pull
/// [`latest_frame`](Self::latest_frame) each paint and crop per
/// [`crop_region`](Self::crop_region).
pub struct PreviewSurface {
    frames: watch::Receiver<Option<VideoFrame>>,
    bounds: SurfaceBounds,
    gravity: VideoGravity,
}

impl PreviewSurface {
    pub fn attached_to(session: &CaptureSession) -> Self {
        Self {
            frames: session.subscribe_frames(),
            bounds: SurfaceBounds::default(),
            gravity: VideoGravity::default(),
        }
    }

    pub fn bounds(&self) -> SurfaceBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: SurfaceBounds) {
        self.bounds = bounds;
    }

    pub fn gravity(&self) -> VideoGravity {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: VideoGravity) {
        self.gravity = gravity;
    }

    /// A second receiver on the same frame feed, for consumers that forward
    /// frames off the controller (the GUI preview task does this).
    pub fn subscribe_frames(&self) -> watch::Receiver<Option<VideoFrame>> {
        self.frames.clone()
    }

    pub fn latest_frame(&mut self) -> Option<VideoFrame> {
        self.frames.borrow_and_update().clone()
    }

    /// The portion of a `frame_width` x `frame_height` frame to draw into the
    /// current bounds under the current gravity. Aspect-fit returns the full
    /// frame (the letterbox is the renderer's concern); aspect-fill crops the
    /// overflowing axis symmetrically.
    pub fn crop_region(&self, frame_width: u32, frame_height: u32) -> CropRegion {
        if frame_width == 0
            || frame_height == 0
            || self.bounds.width == 0
            || self.bounds.height == 0
        {
            return CropRegion::FULL;
        }
        match self.gravity {
            VideoGravity::ResizeAspect => CropRegion::FULL,
            VideoGravity::ResizeAspectFill => {
                let frame_aspect = frame_width as f32 / frame_height as f32;
                let bounds_aspect = self.bounds.width as f32 / self.bounds.height as f32;
                if frame_aspect > bounds_aspect {
                    let visible = bounds_aspect / frame_aspect;
                    let margin = (1.0 - visible) / 2.0;
                    CropRegion {
                        u_min: margin,
                        v_min: 0.0,
                        u_max: 1.0 - margin,
                        v_max: 1.0,
                    }
                } else {
                    let visible = frame_aspect / bounds_aspect;
                    let margin = (1.0 - visible) / 2.0;
                    CropRegion {
                        u_min: 0.0,
                        v_min: margin,
                        u_max: 1.0,
                        v_max: 1.0 - margin,
                    }
                }
            }
        }
    }
}
