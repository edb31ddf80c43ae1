//! Scan orchestration: the controller that assembles and drives a capture
//! session, the delegate interface it reports through, scan configuration,
//! and the view-model the presentation layer renders from.

pub mod config;
pub mod controller;
pub mod view_model;

pub use config::{ScanPolicy, ScannerConfig};
pub use controller::{
    ControllerRequest, ControllerState, ScanController, ScanFlow, ScannerDelegate,
};
pub use view_model::{ScannerViewModel, StatusIndicator};

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod view_model_tests;
