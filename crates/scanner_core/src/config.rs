use serde::{Deserialize, Serialize};
use shared::domain::Symbology;

/// Whether the controller keeps the session alive after a successful decode.
/// Continuous is the default; stop-after-first-match is for callers that want
/// a single answer and a quiet camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    #[default]
    Continuous,
    StopAfterFirstMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    pub symbologies: Vec<Symbology>,
    pub policy: ScanPolicy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            symbologies: Symbology::default_filter(),
            policy: ScanPolicy::default(),
        }
    }
}

impl ScannerConfig {
    pub fn with_policy(mut self, policy: ScanPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_symbologies(mut self, symbologies: Vec<Symbology>) -> Self {
        self.symbologies = symbologies;
        self
    }
}
