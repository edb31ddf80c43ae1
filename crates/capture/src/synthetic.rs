//! Synthetic capture pipeline used by the apps' demo mode and by tests: a
//! camera that renders barcode-like stripe frames, a registry that offers it
//! (or nothing at all), and a detection engine that replays scripted batches.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use shared::domain::Symbology;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::device::{DeviceDescriptor, DeviceRegistry, FrameStream, VideoCaptureDevice};
use crate::frame::VideoFrame;
use crate::metadata::{MetadataObject, SymbologyEngine};

const PATTERN_WIDTH: u32 = 640;
const PATTERN_HEIGHT: u32 = 480;

/// A camera that renders stripe patterns derived from a rotating list of
/// codes. One code is shown per second of stream time.
pub struct TestPatternDevice {
    descriptor: DeviceDescriptor,
    codes: Vec<String>,
    fps: u32,
    frame_limit: Option<u64>,
    connectable: bool,
}

impl TestPatternDevice {
    pub fn new(codes: Vec<String>) -> Self {
        Self {
            descriptor: DeviceDescriptor::new("synthetic-0", "Synthetic Test Pattern"),
            codes,
            fps: 15,
            frame_limit: None,
            connectable: true,
        }
    }

    /// A device that is discoverable but refuses to open, for exercising the
    /// input-attachment failure path.
    pub fn unopenable() -> Self {
        let mut device = Self::new(Vec::new());
        device.connectable = false;
        device
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Ends the stream after `frames` frames instead of running forever.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }
}

impl VideoCaptureDevice for TestPatternDevice {
    fn descriptor(&self) -> DeviceDescriptor {
        self.descriptor.clone()
    }

    fn connect(&self) -> anyhow::Result<Box<dyn FrameStream>> {
        if !self.connectable {
            bail!(
                "synthetic device '{}' is configured to refuse capture",
                self.descriptor.label
            );
        }
        Ok(Box::new(TestPatternStream {
            codes: self.codes.clone(),
            fps: self.fps,
            frame_limit: self.frame_limit,
            produced: 0,
            ticker: None,
        }))
    }
}

struct TestPatternStream {
    codes: Vec<String>,
    fps: u32,
    frame_limit: Option<u64>,
    produced: u64,
    ticker: Option<Interval>,
}

#[async_trait]
impl FrameStream for TestPatternStream {
    async fn next_frame(&mut self) -> anyhow::Result<Option<VideoFrame>> {
        if let Some(limit) = self.frame_limit {
            if self.produced >= limit {
                return Ok(None);
            }
        }
        let fps = self.fps;
        let ticker = self.ticker.get_or_insert_with(|| {
            let mut ticker = interval(Duration::from_secs_f64(1.0 / fps as f64));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;

        let sequence = self.produced;
        self.produced += 1;
        let code = if self.codes.is_empty() {
            None
        } else {
            let index = (sequence / u64::from(self.fps)) as usize % self.codes.len();
            Some(self.codes[index].as_str())
        };
        Ok(Some(VideoFrame::new(
            PATTERN_WIDTH,
            PATTERN_HEIGHT,
            sequence,
            render_test_pattern(code, sequence, PATTERN_WIDTH, PATTERN_HEIGHT),
        )))
    }
}

/// Stripe band across the middle third of the frame, bar widths derived from
/// the code's bytes, plus a bottom ribbon that shifts with the sequence so
/// consecutive frames differ visibly.
fn render_test_pattern(code: Option<&str>, sequence: u64, width: u32, height: u32) -> Vec<u8> {
    let mut luma = vec![0xF0u8; (width * height) as usize];
    if let Some(code) = code {
        let band_top = height / 3;
        let band_bottom = 2 * height / 3;
        let quiet_zone = width / 10;
        let mut x = quiet_zone;
        let mut dark = true;
        'bars: for byte in code.bytes() {
            let bar_width = 2 + u32::from(byte) % 4;
            for _ in 0..bar_width {
                if x >= width - quiet_zone {
                    break 'bars;
                }
                if dark {
                    for y in band_top..band_bottom {
                        luma[(y * width + x) as usize] = 0x10;
                    }
                }
                x += 1;
            }
            dark = !dark;
        }
    }
    let ribbon_row = height - 1;
    let shade = (sequence % 256) as u8;
    for x in 0..width {
        luma[(ribbon_row * width + x) as usize] = shade;
    }
    luma
}

/// Registry that offers a single synthetic device, or none at all for the
/// no-camera failure path.
pub struct SyntheticDeviceRegistry {
    device: Option<Arc<dyn VideoCaptureDevice>>,
}

impl SyntheticDeviceRegistry {
    pub fn with_device(device: Arc<dyn VideoCaptureDevice>) -> Self {
        Self {
            device: Some(device),
        }
    }

    pub fn disconnected() -> Self {
        Self { device: None }
    }
}

impl DeviceRegistry for SyntheticDeviceRegistry {
    fn default_video_device(&self) -> Option<Arc<dyn VideoCaptureDevice>> {
        self.device.clone()
    }
}

enum ScriptMode {
    /// One batch per `detect` call, then silence.
    Script(VecDeque<Vec<MetadataObject>>),
    /// Rotates through `batches` on frames whose sequence is a stride
    /// multiple, advancing one batch per emission.
    Repeating {
        batches: Vec<Vec<MetadataObject>>,
        stride: u64,
    },
}

/// Detection engine replaying canned batches. Stands in for a platform
/// vision framework; supports EAN-8 and EAN-13 unless overridden.
pub struct ScriptedEngine {
    supported: Vec<Symbology>,
    mode: Mutex<ScriptMode>,
}

impl ScriptedEngine {
    pub fn from_script(batches: Vec<Vec<MetadataObject>>) -> Self {
        Self {
            supported: Symbology::default_filter(),
            mode: Mutex::new(ScriptMode::Script(batches.into())),
        }
    }

    pub fn repeating(batch: Vec<MetadataObject>) -> Self {
        Self::cycling(vec![batch])
    }

    /// Rotates through the given batches, one per emission.
    pub fn cycling(batches: Vec<Vec<MetadataObject>>) -> Self {
        Self {
            supported: Symbology::default_filter(),
            mode: Mutex::new(ScriptMode::Repeating { batches, stride: 1 }),
        }
    }

    /// Convenience for the common one-code case.
    pub fn repeating_code(symbology: Symbology, value: impl Into<String>) -> Self {
        Self::repeating(vec![MetadataObject::Code(
            crate::metadata::MachineReadableCode::new(symbology, value),
        )])
    }

    /// Only emit on frames whose sequence is a multiple of `stride`.
    pub fn with_stride(self, stride: u64) -> Self {
        let mode = match self.mode.into_inner() {
            Ok(ScriptMode::Repeating { batches, .. }) => ScriptMode::Repeating {
                batches,
                stride: stride.max(1),
            },
            Ok(other) => other,
            Err(poisoned) => poisoned.into_inner(),
        };
        Self {
            supported: self.supported,
            mode: Mutex::new(mode),
        }
    }

    pub fn with_supported(mut self, supported: Vec<Symbology>) -> Self {
        self.supported = supported;
        self
    }
}

impl SymbologyEngine for ScriptedEngine {
    fn supported_symbologies(&self) -> &[Symbology] {
        &self.supported
    }

    fn detect(&self, frame: &VideoFrame, _symbologies: &[Symbology]) -> Vec<MetadataObject> {
        let Ok(mut mode) = self.mode.lock() else {
            return Vec::new();
        };
        match &mut *mode {
            ScriptMode::Script(batches) => batches.pop_front().unwrap_or_default(),
            ScriptMode::Repeating { batches, stride } => {
                if batches.is_empty() || frame.sequence % *stride != 0 {
                    Vec::new()
                } else {
                    let index = ((frame.sequence / *stride) as usize) % batches.len();
                    batches[index].clone()
                }
            }
        }
    }
}
