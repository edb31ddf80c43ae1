use std::sync::Arc;

use capture::{
    CaptureInput, CaptureSession, DeviceRegistry, MetadataObject, MetadataOutput, PreviewSurface,
    SessionEvent, SurfaceBounds, SymbologyEngine, VideoFrame,
};
use shared::error::CameraError;
use tokio::sync::{broadcast, mpsc, watch};

use crate::config::{ScanPolicy, ScannerConfig};

/// Single-subscriber event interface between the controller and whoever
/// embeds it. The GUI's implementation forwards both callbacks over a channel
/// to the UI thread; the CLI's prints them.
pub trait ScannerDelegate: Send + Sync {
    fn did_find(&self, barcode: &str);
    fn did_surface(&self, error: CameraError);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    NotStarted,
    Running,
    /// Terminal: a new controller is required to scan again.
    FailedSetup,
}

/// Requests accepted by a running controller's event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerRequest {
    Resize(SurfaceBounds),
    Shutdown,
}

/// Outcome of handling one metadata batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFlow {
    Continue,
    Stop,
}

/// Owns a capture session and a preview surface, assembles the scan pipeline
/// during [`setup`](Self::setup), and reports outcomes through its delegate.
///
/// Lifecycle: `NotStarted` → `Running` or `FailedSetup`. Every setup fault
/// reports exactly one `InvalidDeviceInput` and is terminal for this
/// instance; there is no retry. Dropping the controller tears the session
/// down.
pub struct ScanController {
    session: CaptureSession,
    preview: Option<PreviewSurface>,
    delegate: Arc<dyn ScannerDelegate>,
    config: ScannerConfig,
    state: ControllerState,
    metadata_tx: mpsc::UnboundedSender<Vec<MetadataObject>>,
    metadata_rx: Option<mpsc::UnboundedReceiver<Vec<MetadataObject>>>,
    events_rx: Option<broadcast::Receiver<SessionEvent>>,
}

impl ScanController {
    pub fn new(delegate: Arc<dyn ScannerDelegate>, config: ScannerConfig) -> Self {
        let (metadata_tx, metadata_rx) = mpsc::unbounded_channel();
        Self {
            session: CaptureSession::new(),
            preview: None,
            delegate,
            config,
            state: ControllerState::NotStarted,
            metadata_tx,
            metadata_rx: Some(metadata_rx),
            events_rx: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn preview(&self) -> Option<&PreviewSurface> {
        self.preview.as_ref()
    }

    /// Latest-frame feed of the preview surface, if setup got that far.
    pub fn preview_frames(&self) -> Option<watch::Receiver<Option<VideoFrame>>> {
        self.preview.as_ref().map(PreviewSurface::subscribe_frames)
    }

    /// Assembles and starts the capture pipeline: default device → input →
    /// metadata output (restricted to the configured symbologies, feeding
    /// this controller) → preview surface → start. The first fault reports
    /// `InvalidDeviceInput` and aborts setup. Must be called from within a
    /// Tokio runtime.
    pub fn setup(&mut self, registry: &dyn DeviceRegistry, engine: Box<dyn SymbologyEngine>) {
        if self.state != ControllerState::NotStarted {
            tracing::warn!(state = ?self.state, "scan setup requested again; ignoring");
            return;
        }

        let Some(device) = registry.default_video_device() else {
            tracing::warn!("no default video device available");
            return self.fail_setup();
        };
        let input = match CaptureInput::from_device(device.as_ref()) {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!("video input could not be created: {err}");
                return self.fail_setup();
            }
        };
        tracing::info!(device = %input.descriptor().label, "video input selected");
        if let Err(err) = self.session.add_input(input) {
            tracing::warn!("video input rejected by session: {err}");
            return self.fail_setup();
        }

        let mut output = MetadataOutput::new(engine);
        output.set_metadata_delegate(self.metadata_tx.clone());
        if let Err(err) = output.set_symbologies(&self.config.symbologies) {
            tracing::warn!("symbology filter rejected: {err}");
            return self.fail_setup();
        }
        if let Err(err) = self.session.add_output(output) {
            tracing::warn!("metadata output rejected by session: {err}");
            return self.fail_setup();
        }

        self.preview = Some(PreviewSurface::attached_to(&self.session));
        // Subscribe before the session starts so no lifecycle event is missed.
        self.events_rx = Some(self.session.subscribe_events());

        if let Err(err) = self.session.start_running() {
            tracing::warn!("capture session failed to start: {err}");
            return self.fail_setup();
        }
        self.state = ControllerState::Running;
    }

    fn fail_setup(&mut self) {
        self.state = ControllerState::FailedSetup;
        self.session.stop_running();
        self.delegate.did_surface(CameraError::InvalidDeviceInput);
    }

    /// Fits the preview surface to new view bounds. Reports
    /// `InvalidDeviceInput` when no preview surface exists.
    pub fn resize_preview(&mut self, bounds: SurfaceBounds) {
        match self.preview.as_mut() {
            Some(preview) => preview.set_bounds(bounds),
            None => self.delegate.did_surface(CameraError::InvalidDeviceInput),
        }
    }

    /// Handles one delivered metadata batch: the first object must be a
    /// machine-readable code carrying a string value, anything else reports
    /// `InvalidScannedValue`. A decoded value is reported through `did_find`;
    /// scanning then continues or stops per the configured policy.
    pub fn process_metadata(&mut self, objects: Vec<MetadataObject>) -> ScanFlow {
        let Some(first) = objects.into_iter().next() else {
            self.delegate.did_surface(CameraError::InvalidScannedValue);
            return ScanFlow::Continue;
        };
        let MetadataObject::Code(code) = first else {
            self.delegate.did_surface(CameraError::InvalidScannedValue);
            return ScanFlow::Continue;
        };
        let Some(value) = code.value else {
            self.delegate.did_surface(CameraError::InvalidScannedValue);
            return ScanFlow::Continue;
        };
        tracing::debug!(symbology = %code.symbology, "machine readable code decoded");
        self.delegate.did_find(&value);
        match self.config.policy {
            ScanPolicy::Continuous => ScanFlow::Continue,
            ScanPolicy::StopAfterFirstMatch => {
                self.session.stop_running();
                ScanFlow::Stop
            }
        }
    }

    /// Drives the controller until the session ends, a shutdown request
    /// arrives, or the scan policy stops it. Consumes the controller; the
    /// session is torn down on return.
    pub async fn run(mut self, mut requests: mpsc::Receiver<ControllerRequest>) {
        if self.state != ControllerState::Running {
            tracing::warn!(state = ?self.state, "run requested without a running session");
            return;
        }
        let Some(mut metadata_rx) = self.metadata_rx.take() else {
            return;
        };
        let mut events = match self.events_rx.take() {
            Some(events) => events,
            None => self.session.subscribe_events(),
        };
        loop {
            tokio::select! {
                batch = metadata_rx.recv() => match batch {
                    Some(objects) => {
                        if self.process_metadata(objects) == ScanFlow::Stop {
                            break;
                        }
                    }
                    None => break,
                },
                request = requests.recv() => match request {
                    Some(ControllerRequest::Resize(bounds)) => self.resize_preview(bounds),
                    Some(ControllerRequest::Shutdown) | None => break,
                },
                event = events.recv() => match event {
                    Ok(SessionEvent::StreamEnded) => {
                        tracing::info!("scan stream ended");
                        break;
                    }
                    Ok(SessionEvent::StreamFailed { reason }) => {
                        tracing::warn!(%reason, "scan stream failed");
                        self.delegate.did_surface(CameraError::InvalidDeviceInput);
                        break;
                    }
                    Ok(SessionEvent::Stopped) => break,
                    Ok(SessionEvent::Started) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "session event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        self.session.stop_running();
    }
}
