use shared::domain::Symbology;
use thiserror::Error;

/// Faults raised while assembling or starting a capture session. The scanner
/// controller collapses all of these into a single delegate-visible error
/// kind; the variants exist for logs and tests.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("video device '{label}' could not be opened")]
    DeviceUnavailable {
        label: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("capture session already has a video input attached")]
    InputRejected,
    #[error("capture session already has a metadata output attached")]
    OutputRejected,
    #[error("capture session cannot start without a video input")]
    NoInputAttached,
    #[error("capture session cannot start without a metadata output")]
    NoOutputAttached,
    #[error("capture session has already been started")]
    AlreadyStarted,
    #[error("symbology {0} is not offered by the detection engine")]
    UnsupportedSymbology(Symbology),
}
