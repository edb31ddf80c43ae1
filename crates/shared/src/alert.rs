use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CameraError;

/// A user-facing alert: title, message, and the label of its single dismiss
/// action. Immutable once built; presentation layers render it as a modal
/// dialog (GUI) or a plain line (CLI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertItem {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub dismiss_label: String,
}

impl AlertItem {
    fn new(title: &str, message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            message: message.to_string(),
            dismiss_label: "Ok".to_string(),
        }
    }

    pub fn invalid_device_input() -> Self {
        Self::new("Invalid Device Input", "Camera error, unable to capture.")
    }

    pub fn invalid_scanned_value() -> Self {
        Self::new("Invalid Scanned Value", "Value not valid.")
    }

    pub fn for_camera_error(error: CameraError) -> Self {
        match error {
            CameraError::InvalidDeviceInput => Self::invalid_device_input(),
            CameraError::InvalidScannedValue => Self::invalid_scanned_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_records_carry_expected_copy() {
        let device = AlertItem::invalid_device_input();
        assert_eq!(device.title, "Invalid Device Input");
        assert_eq!(device.message, "Camera error, unable to capture.");
        assert_eq!(device.dismiss_label, "Ok");

        let value = AlertItem::invalid_scanned_value();
        assert_eq!(value.title, "Invalid Scanned Value");
        assert_eq!(value.message, "Value not valid.");
        assert_eq!(value.dismiss_label, "Ok");
    }

    #[test]
    fn camera_errors_map_to_their_catalog_records() {
        assert_eq!(
            AlertItem::for_camera_error(CameraError::InvalidDeviceInput).title,
            "Invalid Device Input"
        );
        assert_eq!(
            AlertItem::for_camera_error(CameraError::InvalidScannedValue).title,
            "Invalid Scanned Value"
        );
    }
}
