use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::device::{DeviceDescriptor, FrameStream, VideoCaptureDevice};
use crate::error::CaptureError;
use crate::frame::VideoFrame;
use crate::metadata::MetadataOutput;

/// Lifecycle notifications published by a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    Stopped,
    /// The frame stream ran out (finite sources, clean device shutdown).
    StreamEnded,
    /// The frame stream failed mid-capture.
    StreamFailed { reason: String },
}

/// A connected device wrapped for attachment to a session.
pub struct CaptureInput {
    descriptor: DeviceDescriptor,
    stream: Box<dyn FrameStream>,
}

impl CaptureInput {
    /// Connects the device. Fails when it cannot be opened, which callers
    /// treat the same as the device being absent.
    pub fn from_device(device: &dyn VideoCaptureDevice) -> Result<Self, CaptureError> {
        let descriptor = device.descriptor();
        let stream = device
            .connect()
            .map_err(|source| CaptureError::DeviceUnavailable {
                label: descriptor.label.clone(),
                source,
            })?;
        Ok(Self { descriptor, stream })
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }
}

/// Single-use capture session: accepts one input and one metadata output,
/// then pumps frames on a spawned task until the stream ends, the session is
/// stopped, or it is dropped. It cannot be restarted; a new scan attempt
/// builds a new session.
pub struct CaptureSession {
    input: Option<CaptureInput>,
    output: Option<MetadataOutput>,
    frames_tx: watch::Sender<Option<VideoFrame>>,
    events_tx: broadcast::Sender<SessionEvent>,
    running: Arc<AtomicBool>,
    started: bool,
    pump: Option<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn new() -> Self {
        let (frames_tx, _) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(16);
        Self {
            input: None,
            output: None,
            frames_tx,
            events_tx,
            running: Arc::new(AtomicBool::new(false)),
            started: false,
            pump: None,
        }
    }

    pub fn can_add_input(&self) -> bool {
        !self.started && self.input.is_none()
    }

    pub fn add_input(&mut self, input: CaptureInput) -> Result<(), CaptureError> {
        if !self.can_add_input() {
            return Err(CaptureError::InputRejected);
        }
        self.input = Some(input);
        Ok(())
    }

    pub fn can_add_output(&self) -> bool {
        !self.started && self.output.is_none()
    }

    pub fn add_output(&mut self, output: MetadataOutput) -> Result<(), CaptureError> {
        if !self.can_add_output() {
            return Err(CaptureError::OutputRejected);
        }
        self.output = Some(output);
        Ok(())
    }

    /// Latest-frame feed for preview surfaces. Holds `None` until the first
    /// frame arrives.
    pub fn subscribe_frames(&self) -> watch::Receiver<Option<VideoFrame>> {
        self.frames_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Starts pumping frames. Must be called from within a Tokio runtime.
    pub fn start_running(&mut self) -> Result<(), CaptureError> {
        if self.started {
            return Err(CaptureError::AlreadyStarted);
        }
        let Some(input) = self.input.take() else {
            return Err(CaptureError::NoInputAttached);
        };
        let Some(output) = self.output.take() else {
            self.input = Some(input);
            return Err(CaptureError::NoOutputAttached);
        };

        self.started = true;
        self.running.store(true, Ordering::SeqCst);
        tracing::info!(device = %input.descriptor.label, "capture session starting");
        self.pump = Some(tokio::spawn(pump_frames(
            input.stream,
            output,
            self.frames_tx.clone(),
            self.events_tx.clone(),
            Arc::clone(&self.running),
        )));
        let _ = self.events_tx.send(SessionEvent::Started);
        Ok(())
    }

    pub fn stop_running(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("capture session stopped");
            let _ = self.events_tx.send(SessionEvent::Stopped);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop_running();
    }
}

async fn pump_frames(
    mut stream: Box<dyn FrameStream>,
    output: MetadataOutput,
    frames: watch::Sender<Option<VideoFrame>>,
    events: broadcast::Sender<SessionEvent>,
    running: Arc<AtomicBool>,
) {
    loop {
        match stream.next_frame().await {
            Ok(Some(frame)) => {
                frames.send_replace(Some(frame.clone()));
                output.process_frame(&frame);
            }
            Ok(None) => {
                tracing::debug!("capture stream ended");
                let _ = events.send(SessionEvent::StreamEnded);
                break;
            }
            Err(err) => {
                tracing::warn!("capture stream failed: {err:#}");
                let _ = events.send(SessionEvent::StreamFailed {
                    reason: format!("{err:#}"),
                });
                break;
            }
        }
    }
    running.store(false, Ordering::SeqCst);
    let _ = events.send(SessionEvent::Stopped);
}
