use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use capture::synthetic::{ScriptedEngine, SyntheticDeviceRegistry, TestPatternDevice};
use capture::{MachineReadableCode, MetadataObject};
use clap::Parser;
use scanner_core::{
    ControllerRequest, ControllerState, ScanController, ScanPolicy, ScannerConfig, ScannerDelegate,
};
use shared::alert::AlertItem;
use shared::domain::Symbology;
use shared::error::CameraError;
use tokio::sync::mpsc;

/// Headless scan harness: runs the scanner controller against the synthetic
/// capture pipeline and prints every delegate callback.
#[derive(Parser, Debug)]
struct Args {
    /// Codes the synthetic camera renders and the scripted engine reports.
    #[arg(long, value_delimiter = ',', default_value = "4006381333931")]
    codes: Vec<String>,
    /// Synthetic camera frame rate.
    #[arg(long, default_value_t = 15)]
    fps: u32,
    /// End the stream after this many frames (runs until Ctrl-C otherwise).
    #[arg(long)]
    frames: Option<u64>,
    /// Report one detection every N frames.
    #[arg(long, default_value_t = 15)]
    stride: u64,
    /// Stop the session after the first reported code.
    #[arg(long)]
    stop_after_first: bool,
    /// Print decode events as JSON lines.
    #[arg(long)]
    json: bool,
    /// Pretend no camera is present (exercises the failure alert).
    #[arg(long)]
    no_device: bool,
}

struct ConsoleDelegate {
    json: bool,
    found: AtomicUsize,
    surfaced: AtomicUsize,
}

impl ConsoleDelegate {
    fn new(json: bool) -> Arc<Self> {
        Arc::new(Self {
            json,
            found: AtomicUsize::new(0),
            surfaced: AtomicUsize::new(0),
        })
    }

    fn found(&self) -> usize {
        self.found.load(Ordering::Relaxed)
    }

    fn surfaced(&self) -> usize {
        self.surfaced.load(Ordering::Relaxed)
    }
}

impl ScannerDelegate for ConsoleDelegate {
    fn did_find(&self, barcode: &str) {
        self.found.fetch_add(1, Ordering::Relaxed);
        if self.json {
            println!(
                "{}",
                serde_json::json!({
                    "event": "barcode",
                    "value": barcode,
                    "at": chrono::Utc::now().to_rfc3339(),
                })
            );
        } else {
            println!("{} {barcode}", chrono::Local::now().format("%H:%M:%S"));
        }
    }

    fn did_surface(&self, error: CameraError) {
        self.surfaced.fetch_add(1, Ordering::Relaxed);
        let alert = AlertItem::for_camera_error(error);
        if self.json {
            println!(
                "{}",
                serde_json::json!({
                    "event": "alert",
                    "title": alert.title,
                    "message": alert.message,
                })
            );
        } else {
            eprintln!("{}: {}", alert.title, alert.message);
        }
    }
}

/// EAN-8 codes are eight digits; everything else is treated as EAN-13.
fn symbology_for(code: &str) -> Symbology {
    if code.len() == 8 {
        Symbology::Ean8
    } else {
        Symbology::Ean13
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let registry = if args.no_device {
        SyntheticDeviceRegistry::disconnected()
    } else {
        let mut device = TestPatternDevice::new(args.codes.clone()).with_fps(args.fps);
        if let Some(frames) = args.frames {
            device = device.with_frame_limit(frames);
        }
        SyntheticDeviceRegistry::with_device(Arc::new(device))
    };

    let batches = args
        .codes
        .iter()
        .map(|code| {
            vec![MetadataObject::Code(MachineReadableCode::new(
                symbology_for(code),
                code.clone(),
            ))]
        })
        .collect();
    let engine = ScriptedEngine::cycling(batches).with_stride(args.stride.max(1));

    let policy = if args.stop_after_first {
        ScanPolicy::StopAfterFirstMatch
    } else {
        ScanPolicy::Continuous
    };
    let delegate = ConsoleDelegate::new(args.json);
    let mut controller = ScanController::new(
        delegate.clone(),
        ScannerConfig::default().with_policy(policy),
    );
    controller.setup(&registry, Box::new(engine));
    if controller.state() != ControllerState::Running {
        anyhow::bail!("scanner setup failed");
    }

    let (requests_tx, requests_rx) = mpsc::channel(8);
    let mut run = tokio::spawn(controller.run(requests_rx));
    let mut finished = false;
    tokio::select! {
        result = &mut run => {
            result?;
            finished = true;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received; shutting scanner down");
            let _ = requests_tx.send(ControllerRequest::Shutdown).await;
        }
    }
    if !finished {
        run.await?;
    }

    tracing::info!(
        found = delegate.found(),
        alerts = delegate.surfaced(),
        "scan session finished"
    );
    Ok(())
}
