use shared::domain::Symbology;
use tokio::sync::mpsc;

use crate::error::CaptureError;
use crate::frame::VideoFrame;

/// A decoded symbology result. `value` is absent when the engine recognized
/// the pattern but could not extract a string payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineReadableCode {
    pub symbology: Symbology,
    pub value: Option<String>,
}

impl MachineReadableCode {
    pub fn new(symbology: Symbology, value: impl Into<String>) -> Self {
        Self {
            symbology,
            value: Some(value.into()),
        }
    }

    pub fn without_value(symbology: Symbology) -> Self {
        Self {
            symbology,
            value: None,
        }
    }
}

/// One object emitted by the detection engine for a frame. `Unrecognized`
/// stands for a detection the engine could not classify as a machine-readable
/// code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataObject {
    Code(MachineReadableCode),
    Unrecognized,
}

/// The detection seam. A platform vision framework implements this; the
/// in-repo [`synthetic::ScriptedEngine`](crate::synthetic::ScriptedEngine)
/// replays canned batches for demos and tests.
///
/// `detect` runs on the session's pump task, off the UI thread, once per
/// captured frame.
pub trait SymbologyEngine: Send + Sync {
    fn supported_symbologies(&self) -> &[Symbology];
    fn detect(&self, frame: &VideoFrame, symbologies: &[Symbology]) -> Vec<MetadataObject>;
}

/// Capture-pipeline stage that inspects frames for encoded patterns and
/// delivers decoded objects to a registered callback channel.
///
/// Freshly constructed outputs watch for nothing; callers restrict them to a
/// symbology set before starting the session. Only non-empty detection
/// batches are delivered.
pub struct MetadataOutput {
    engine: Box<dyn SymbologyEngine>,
    symbologies: Vec<Symbology>,
    delegate: Option<mpsc::UnboundedSender<Vec<MetadataObject>>>,
}

impl MetadataOutput {
    pub fn new(engine: Box<dyn SymbologyEngine>) -> Self {
        Self {
            engine,
            symbologies: Vec::new(),
            delegate: None,
        }
    }

    /// Symbologies the underlying engine can detect.
    pub fn available_symbologies(&self) -> &[Symbology] {
        self.engine.supported_symbologies()
    }

    /// Restricts detection to `requested`. Fails on the first symbology the
    /// engine does not offer, leaving the previous filter in place.
    pub fn set_symbologies(&mut self, requested: &[Symbology]) -> Result<(), CaptureError> {
        let available = self.engine.supported_symbologies();
        for symbology in requested {
            if !available.contains(symbology) {
                return Err(CaptureError::UnsupportedSymbology(*symbology));
            }
        }
        self.symbologies = requested.to_vec();
        Ok(())
    }

    pub fn symbologies(&self) -> &[Symbology] {
        &self.symbologies
    }

    /// Registers the channel decoded batches are delivered on. The receiver
    /// side decides which executor drains it, which is how delivery stays on
    /// the caller's chosen queue.
    pub fn set_metadata_delegate(&mut self, delegate: mpsc::UnboundedSender<Vec<MetadataObject>>) {
        self.delegate = Some(delegate);
    }

    pub(crate) fn process_frame(&self, frame: &VideoFrame) {
        let mut objects = self.engine.detect(frame, &self.symbologies);
        objects.retain(|object| match object {
            MetadataObject::Code(code) => self.symbologies.contains(&code.symbology),
            MetadataObject::Unrecognized => true,
        });
        if objects.is_empty() {
            return;
        }
        tracing::trace!(
            frame = frame.sequence,
            count = objects.len(),
            "metadata output delivering detection batch"
        );
        if let Some(delegate) = &self.delegate {
            // The registrant may already be gone during teardown.
            let _ = delegate.send(objects);
        }
    }
}
