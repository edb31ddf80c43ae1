use super::*;
use std::sync::{Arc, Mutex};

use capture::synthetic::{ScriptedEngine, SyntheticDeviceRegistry, TestPatternDevice};
use capture::{MachineReadableCode, MetadataObject, SurfaceBounds};
use shared::domain::Symbology;
use shared::error::CameraError;

use crate::config::{ScanPolicy, ScannerConfig};
use crate::controller::{ControllerState, ScanController, ScanFlow, ScannerDelegate};

struct RecordingDelegate {
    finds: Mutex<Vec<String>>,
    errors: Mutex<Vec<CameraError>>,
}

impl RecordingDelegate {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            finds: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        })
    }

    fn finds(&self) -> Vec<String> {
        self.finds.lock().expect("finds lock").clone()
    }

    fn errors(&self) -> Vec<CameraError> {
        self.errors.lock().expect("errors lock").clone()
    }
}

impl ScannerDelegate for RecordingDelegate {
    fn did_find(&self, barcode: &str) {
        self.finds.lock().expect("finds lock").push(barcode.to_string());
    }

    fn did_surface(&self, error: CameraError) {
        self.errors.lock().expect("errors lock").push(error);
    }
}

fn silent_engine() -> Box<ScriptedEngine> {
    Box::new(ScriptedEngine::from_script(Vec::new()))
}

fn working_registry() -> SyntheticDeviceRegistry {
    SyntheticDeviceRegistry::with_device(Arc::new(
        TestPatternDevice::new(vec!["4006381333931".into()]).with_fps(200),
    ))
}

fn running_controller(policy: ScanPolicy) -> (ScanController, Arc<RecordingDelegate>) {
    let delegate = RecordingDelegate::new();
    let config = ScannerConfig::default().with_policy(policy);
    let mut controller = ScanController::new(delegate.clone(), config);
    controller.setup(&working_registry(), silent_engine());
    assert_eq!(controller.state(), ControllerState::Running);
    (controller, delegate)
}

#[test]
fn missing_device_reports_exactly_one_invalid_device_input() {
    let delegate = RecordingDelegate::new();
    let mut controller = ScanController::new(delegate.clone(), ScannerConfig::default());
    controller.setup(&SyntheticDeviceRegistry::disconnected(), silent_engine());

    assert_eq!(controller.state(), ControllerState::FailedSetup);
    assert_eq!(delegate.errors(), vec![CameraError::InvalidDeviceInput]);
    assert!(delegate.finds().is_empty());
    assert!(!controller.session().is_running());
}

#[test]
fn unopenable_device_reports_exactly_one_invalid_device_input() {
    let delegate = RecordingDelegate::new();
    let registry =
        SyntheticDeviceRegistry::with_device(Arc::new(TestPatternDevice::unopenable()));
    let mut controller = ScanController::new(delegate.clone(), ScannerConfig::default());
    controller.setup(&registry, silent_engine());

    assert_eq!(controller.state(), ControllerState::FailedSetup);
    assert_eq!(delegate.errors(), vec![CameraError::InvalidDeviceInput]);
    assert!(!controller.session().is_running());
}

#[test]
fn unsupported_symbology_fails_setup() {
    let delegate = RecordingDelegate::new();
    let config = ScannerConfig::default().with_symbologies(vec![Symbology::QrCode]);
    let mut controller = ScanController::new(delegate.clone(), config);
    controller.setup(&working_registry(), silent_engine());

    assert_eq!(controller.state(), ControllerState::FailedSetup);
    assert_eq!(delegate.errors(), vec![CameraError::InvalidDeviceInput]);
    assert!(!controller.session().is_running());
}

#[tokio::test]
async fn successful_setup_starts_the_session() {
    let (controller, delegate) = running_controller(ScanPolicy::Continuous);
    assert!(controller.session().is_running());
    assert!(controller.preview().is_some());
    assert!(delegate.errors().is_empty());
    assert!(delegate.finds().is_empty());
}

#[tokio::test]
async fn repeated_setup_is_ignored() {
    let (mut controller, delegate) = running_controller(ScanPolicy::Continuous);
    controller.setup(&SyntheticDeviceRegistry::disconnected(), silent_engine());
    assert_eq!(controller.state(), ControllerState::Running);
    assert!(delegate.errors().is_empty());
}

#[tokio::test]
async fn empty_batch_reports_invalid_scanned_value_and_keeps_scanning() {
    let (mut controller, delegate) = running_controller(ScanPolicy::Continuous);
    assert_eq!(controller.process_metadata(Vec::new()), ScanFlow::Continue);
    assert_eq!(delegate.errors(), vec![CameraError::InvalidScannedValue]);
    assert!(controller.session().is_running());
}

#[tokio::test]
async fn unrecognized_first_object_reports_invalid_scanned_value() {
    let (mut controller, delegate) = running_controller(ScanPolicy::Continuous);
    assert_eq!(
        controller.process_metadata(vec![MetadataObject::Unrecognized]),
        ScanFlow::Continue
    );
    assert_eq!(delegate.errors(), vec![CameraError::InvalidScannedValue]);
    assert!(controller.session().is_running());
}

#[tokio::test]
async fn valueless_code_reports_invalid_scanned_value() {
    let (mut controller, delegate) = running_controller(ScanPolicy::Continuous);
    let batch = vec![MetadataObject::Code(MachineReadableCode::without_value(
        Symbology::Ean13,
    ))];
    assert_eq!(controller.process_metadata(batch), ScanFlow::Continue);
    assert_eq!(delegate.errors(), vec![CameraError::InvalidScannedValue]);
}

#[tokio::test]
async fn valued_code_reports_exactly_one_find_and_keeps_scanning() {
    let (mut controller, delegate) = running_controller(ScanPolicy::Continuous);
    let batch = vec![MetadataObject::Code(MachineReadableCode::new(
        Symbology::Ean8,
        "96385074",
    ))];
    assert_eq!(controller.process_metadata(batch), ScanFlow::Continue);
    assert_eq!(delegate.finds(), vec!["96385074".to_string()]);
    assert!(delegate.errors().is_empty());
    assert!(controller.session().is_running());
}

#[tokio::test]
async fn stop_after_first_match_halts_the_session() {
    let (mut controller, delegate) = running_controller(ScanPolicy::StopAfterFirstMatch);
    let batch = vec![MetadataObject::Code(MachineReadableCode::new(
        Symbology::Ean13,
        "4006381333931",
    ))];
    assert_eq!(controller.process_metadata(batch), ScanFlow::Stop);
    assert_eq!(delegate.finds(), vec!["4006381333931".to_string()]);
    assert!(!controller.session().is_running());
}

#[test]
fn resize_without_preview_reports_invalid_device_input() {
    let delegate = RecordingDelegate::new();
    let mut controller = ScanController::new(delegate.clone(), ScannerConfig::default());
    controller.resize_preview(SurfaceBounds::new(320, 240));
    assert_eq!(delegate.errors(), vec![CameraError::InvalidDeviceInput]);
}

#[tokio::test]
async fn resize_with_preview_updates_the_surface_bounds() {
    let (mut controller, delegate) = running_controller(ScanPolicy::Continuous);
    controller.resize_preview(SurfaceBounds::new(320, 240));
    assert!(delegate.errors().is_empty());
    let preview = controller.preview().expect("preview surface");
    assert_eq!(preview.bounds(), SurfaceBounds::new(320, 240));
}
