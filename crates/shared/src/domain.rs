use serde::{Deserialize, Serialize};

/// Machine-readable symbologies the capture pipeline can be asked to watch
/// for. Which of these a given detection engine actually offers is reported
/// by the engine itself; the default scan filter is EAN-8 + EAN-13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Ean8,
    Ean13,
    Code128,
    QrCode,
}

impl Symbology {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ean8 => "EAN-8",
            Self::Ean13 => "EAN-13",
            Self::Code128 => "Code 128",
            Self::QrCode => "QR Code",
        }
    }

    /// The filter a freshly constructed scanner watches for.
    pub fn default_filter() -> Vec<Symbology> {
        vec![Self::Ean8, Self::Ean13]
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
