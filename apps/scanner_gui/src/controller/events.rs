//! Events delivered from the backend scan worker to the UI thread.

use shared::error::CameraError;

use crate::ui::app::PreviewImage;

pub enum UiEvent {
    ScannerStarted,
    ScannerStopped,
    BarcodeFound(String),
    ScannerError(CameraError),
    PreviewFrame(PreviewImage),
    Info(String),
    WorkerFailed(String),
}
