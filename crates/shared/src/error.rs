use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two failure classes the scanner surfaces to its delegate.
///
/// `InvalidDeviceInput` covers every capture-setup fault (no camera, input or
/// output could not be attached, session failed to start). `InvalidScannedValue`
/// covers a delivered detection batch that carries nothing decodable. Both are
/// terminal for the attempt and non-fatal to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraError {
    #[error("camera input could not be captured")]
    InvalidDeviceInput,
    #[error("captured frame carried no decodable value")]
    InvalidScannedValue,
}
