use shared::alert::AlertItem;

const NOT_SCANNED_TEXT: &str = "Barcode Not Scanned";

/// Which color the status view should use; the presentation layer picks the
/// concrete warning/success colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    Empty,
    Populated,
}

/// Observable scan state for the presentation layer: the latest scanned code
/// (overwritten on every successful decode) and at most one active alert.
/// Derivations are pure; nothing flows from here back into the controller.
#[derive(Debug, Clone, Default)]
pub struct ScannerViewModel {
    pub scanned_code: String,
    pub alert: Option<AlertItem>,
}

impl ScannerViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_text(&self) -> &str {
        if self.scanned_code.is_empty() {
            NOT_SCANNED_TEXT
        } else {
            &self.scanned_code
        }
    }

    pub fn status_indicator(&self) -> StatusIndicator {
        if self.scanned_code.is_empty() {
            StatusIndicator::Empty
        } else {
            StatusIndicator::Populated
        }
    }

    pub fn record_scan(&mut self, code: impl Into<String>) {
        self.scanned_code = code.into();
    }

    /// Presenting replaces any active alert; at most one is shown at a time.
    pub fn present_alert(&mut self, alert: AlertItem) {
        self.alert = Some(alert);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }
}
