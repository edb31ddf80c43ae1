//! UI layer: the app shell and its panels.

pub mod app;

pub use app::{PersistedScannerSettings, ScannerGuiApp, SETTINGS_STORAGE_KEY};
