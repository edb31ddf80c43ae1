mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::backend_bridge::runtime::{DeviceSelection, StartupConfig};
use crate::controller::events::UiEvent;
use crate::ui::{PersistedScannerSettings, ScannerGuiApp, SETTINGS_STORAGE_KEY};

#[derive(Parser, Debug)]
struct Args {
    /// Camera to offer the scanner.
    #[arg(long, value_enum, default_value_t = DeviceSelection::Synthetic)]
    device: DeviceSelection,
    /// Codes the synthetic camera renders and reports.
    #[arg(long, value_delimiter = ',', default_value = "4006381333931,96385074")]
    codes: Vec<String>,
    /// Synthetic camera frame rate.
    #[arg(long, default_value_t = 15)]
    fps: u32,
    /// Report one detection every N frames.
    #[arg(long, default_value_t = 15)]
    stride: u64,
}

/// `BARCODE_SCANNER_DEVICE` overrides the CLI device selection, handy for
/// scripts and desktop launchers.
fn device_from_env() -> Option<DeviceSelection> {
    let value = std::env::var("BARCODE_SCANNER_DEVICE").ok()?;
    let value = value.trim().to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }
    match value.as_str() {
        "synthetic" => Some(DeviceSelection::Synthetic),
        "none" => Some(DeviceSelection::None),
        other => {
            tracing::warn!(value = other, "unrecognized BARCODE_SCANNER_DEVICE; ignoring");
            None
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let startup = StartupConfig {
        device: device_from_env().unwrap_or(args.device),
        codes: args.codes,
        fps: args.fps,
        stride: args.stride,
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, startup);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Barcode Scanner")
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Barcode Scanner",
        options,
        Box::new(|cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedScannerSettings>(&text).ok())
            });
            Ok(Box::new(ScannerGuiApp::bootstrap(cmd_tx, ui_rx, persisted)))
        }),
    )
}
