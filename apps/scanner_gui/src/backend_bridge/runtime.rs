//! Backend scan worker: owns the Tokio runtime and the scanner controller,
//! and translates queued UI commands into controller requests.

use std::sync::Arc;
use std::thread;

use capture::synthetic::{ScriptedEngine, SyntheticDeviceRegistry, TestPatternDevice};
use capture::{MachineReadableCode, MetadataObject};
use clap::ValueEnum;
use crossbeam_channel::{Receiver, Sender};
use scanner_core::{
    ControllerRequest, ControllerState, ScanController, ScanPolicy, ScannerConfig, ScannerDelegate,
};
use shared::domain::Symbology;
use shared::error::CameraError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::app::PreviewImage;

/// Which camera the backend offers to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceSelection {
    /// Synthetic test-pattern camera.
    Synthetic,
    /// No camera at all; every scan attempt fails with the device alert.
    None,
}

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub device: DeviceSelection,
    pub codes: Vec<String>,
    pub fps: u32,
    pub stride: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            device: DeviceSelection::Synthetic,
            codes: vec!["4006381333931".to_string(), "96385074".to_string()],
            fps: 15,
            stride: 15,
        }
    }
}

struct UiDelegate {
    ui_tx: Sender<UiEvent>,
}

impl ScannerDelegate for UiDelegate {
    fn did_find(&self, barcode: &str) {
        let _ = self
            .ui_tx
            .try_send(UiEvent::BarcodeFound(barcode.to_string()));
    }

    fn did_surface(&self, error: CameraError) {
        let _ = self.ui_tx.try_send(UiEvent::ScannerError(error));
    }
}

struct ActiveScan {
    requests: mpsc::Sender<ControllerRequest>,
    run: JoinHandle<()>,
}

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, startup: StartupConfig) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::WorkerFailed(format!(
                    "failed to build scanner runtime: {err}"
                )));
                tracing::error!("failed to build scanner runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info("Scanner worker ready".to_string()));
            let mut active: Option<ActiveScan> = None;
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::StartScanning { policy } => {
                        let busy = active
                            .as_ref()
                            .is_some_and(|scan| !scan.run.is_finished());
                        if busy {
                            tracing::warn!("scan session already active; ignoring start request");
                            let _ = ui_tx
                                .try_send(UiEvent::Info("Scan session already active".to_string()));
                            continue;
                        }
                        active = start_scan(&startup, policy, &ui_tx);
                        if active.is_some() {
                            let _ = ui_tx.try_send(UiEvent::ScannerStarted);
                        }
                    }
                    BackendCommand::StopScanning => {
                        if let Some(scan) = active.take() {
                            let _ = scan.requests.try_send(ControllerRequest::Shutdown);
                        }
                    }
                    BackendCommand::ResizePreview { bounds } => {
                        if let Some(scan) = &active {
                            let _ = scan.requests.try_send(ControllerRequest::Resize(bounds));
                        }
                    }
                }
            }
        });
    });
}

fn start_scan(
    startup: &StartupConfig,
    policy: ScanPolicy,
    ui_tx: &Sender<UiEvent>,
) -> Option<ActiveScan> {
    let registry = build_registry(startup);
    let engine = build_engine(startup);
    let delegate = Arc::new(UiDelegate {
        ui_tx: ui_tx.clone(),
    });
    let mut controller = ScanController::new(
        delegate,
        ScannerConfig::default().with_policy(policy),
    );
    controller.setup(&registry, Box::new(engine));
    if controller.state() != ControllerState::Running {
        // The delegate already surfaced the alert to the UI.
        tracing::warn!("scanner setup failed");
        return None;
    }

    if let Some(mut frames) = controller.preview_frames() {
        let ui_tx = ui_tx.clone();
        tokio::spawn(async move {
            while frames.changed().await.is_ok() {
                let image = frames
                    .borrow_and_update()
                    .as_ref()
                    .map(PreviewImage::from_frame);
                if let Some(image) = image {
                    // Bounded channel: drop the frame when the UI is behind.
                    let _ = ui_tx.try_send(UiEvent::PreviewFrame(image));
                }
            }
        });
    }

    let (requests_tx, requests_rx) = mpsc::channel(8);
    let ui_done = ui_tx.clone();
    let run = tokio::spawn(async move {
        controller.run(requests_rx).await;
        let _ = ui_done.try_send(UiEvent::ScannerStopped);
    });
    Some(ActiveScan {
        requests: requests_tx,
        run,
    })
}

fn build_registry(startup: &StartupConfig) -> SyntheticDeviceRegistry {
    match startup.device {
        DeviceSelection::Synthetic => SyntheticDeviceRegistry::with_device(Arc::new(
            TestPatternDevice::new(startup.codes.clone()).with_fps(startup.fps),
        )),
        DeviceSelection::None => SyntheticDeviceRegistry::disconnected(),
    }
}

fn build_engine(startup: &StartupConfig) -> ScriptedEngine {
    let batches = startup
        .codes
        .iter()
        .map(|code| {
            vec![MetadataObject::Code(MachineReadableCode::new(
                symbology_for(code),
                code.clone(),
            ))]
        })
        .collect();
    ScriptedEngine::cycling(batches).with_stride(startup.stride.max(1))
}

/// EAN-8 codes are eight digits; everything else is treated as EAN-13.
fn symbology_for(code: &str) -> Symbology {
    if code.len() == 8 {
        Symbology::Ean8
    } else {
        Symbology::Ean13
    }
}
