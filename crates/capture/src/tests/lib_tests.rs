use super::*;
use shared::domain::Symbology;
use tokio::sync::mpsc;

use crate::synthetic::{ScriptedEngine, SyntheticDeviceRegistry, TestPatternDevice};

fn valued_code(symbology: Symbology, value: &str) -> MetadataObject {
    MetadataObject::Code(MachineReadableCode::new(symbology, value))
}

#[test]
fn session_accepts_one_input_and_one_output() {
    let device = TestPatternDevice::new(vec!["96385074".into()]);
    let mut session = CaptureSession::new();

    assert!(session.can_add_input());
    let input = CaptureInput::from_device(&device).expect("connect");
    session.add_input(input).expect("first input");
    assert!(!session.can_add_input());

    let second = CaptureInput::from_device(&device).expect("connect again");
    assert!(matches!(
        session.add_input(second),
        Err(CaptureError::InputRejected)
    ));

    assert!(session.can_add_output());
    let output = MetadataOutput::new(Box::new(ScriptedEngine::from_script(Vec::new())));
    session.add_output(output).expect("first output");
    assert!(!session.can_add_output());

    let second = MetadataOutput::new(Box::new(ScriptedEngine::from_script(Vec::new())));
    assert!(matches!(
        session.add_output(second),
        Err(CaptureError::OutputRejected)
    ));
}

#[test]
fn session_refuses_to_start_incomplete() {
    let mut session = CaptureSession::new();
    assert!(matches!(
        session.start_running(),
        Err(CaptureError::NoInputAttached)
    ));

    let device = TestPatternDevice::new(Vec::new());
    let input = CaptureInput::from_device(&device).expect("connect");
    session.add_input(input).expect("input");
    assert!(matches!(
        session.start_running(),
        Err(CaptureError::NoOutputAttached)
    ));
    // The failed start must not consume the attached input.
    assert!(!session.can_add_input());
}

#[test]
fn unopenable_device_fails_input_wrapping() {
    let device = TestPatternDevice::unopenable();
    let err = match CaptureInput::from_device(&device) {
        Ok(_) => panic!("unopenable device must not connect"),
        Err(err) => err,
    };
    assert!(matches!(err, CaptureError::DeviceUnavailable { .. }));
}

#[test]
fn disconnected_registry_offers_no_device() {
    assert!(SyntheticDeviceRegistry::disconnected()
        .default_video_device()
        .is_none());
}

#[test]
fn metadata_output_rejects_unsupported_symbology() {
    let engine = ScriptedEngine::from_script(Vec::new());
    let mut output = MetadataOutput::new(Box::new(engine));
    assert_eq!(
        output.available_symbologies(),
        &[Symbology::Ean8, Symbology::Ean13]
    );

    let err = output
        .set_symbologies(&[Symbology::Ean13, Symbology::QrCode])
        .expect_err("qr is not offered");
    assert!(matches!(
        err,
        CaptureError::UnsupportedSymbology(Symbology::QrCode)
    ));
    // The failed call must leave the previous (empty) filter untouched.
    assert!(output.symbologies().is_empty());

    output
        .set_symbologies(&[Symbology::Ean8, Symbology::Ean13])
        .expect("both defaults are offered");
    assert_eq!(
        output.symbologies(),
        &[Symbology::Ean8, Symbology::Ean13]
    );
}

#[test]
fn metadata_output_delivers_only_matching_nonempty_batches() {
    let engine = ScriptedEngine::from_script(vec![
        vec![valued_code(Symbology::Ean13, "4006381333931")],
        Vec::new(),
        vec![valued_code(Symbology::Ean8, "96385074")],
        vec![MetadataObject::Unrecognized],
    ])
    .with_supported(vec![Symbology::Ean8, Symbology::Ean13]);
    let mut output = MetadataOutput::new(Box::new(engine));
    output
        .set_symbologies(&[Symbology::Ean13])
        .expect("filter ean13");
    let (tx, mut rx) = mpsc::unbounded_channel();
    output.set_metadata_delegate(tx);

    let frame = VideoFrame::new(4, 4, 0, vec![0; 16]);
    for _ in 0..4 {
        output.process_frame(&frame);
    }

    let first = rx.try_recv().expect("ean13 batch delivered");
    assert_eq!(first, vec![valued_code(Symbology::Ean13, "4006381333931")]);
    // Empty batch dropped, EAN-8 filtered out entirely, unrecognized kept.
    let second = rx.try_recv().expect("unrecognized batch delivered");
    assert_eq!(second, vec![MetadataObject::Unrecognized]);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn session_pumps_frames_until_the_stream_ends() {
    let device = TestPatternDevice::new(vec!["4006381333931".into()])
        .with_fps(200)
        .with_frame_limit(6);
    let engine = ScriptedEngine::repeating_code(Symbology::Ean13, "4006381333931");
    let mut output = MetadataOutput::new(Box::new(engine));
    output.set_symbologies(&[Symbology::Ean13]).expect("filter");
    let (tx, mut rx) = mpsc::unbounded_channel();
    output.set_metadata_delegate(tx);

    let mut session = CaptureSession::new();
    let mut events = session.subscribe_events();
    let mut frames = session.subscribe_frames();
    session
        .add_input(CaptureInput::from_device(&device).expect("connect"))
        .expect("input");
    session.add_output(output).expect("output");
    session.start_running().expect("start");
    assert!(session.is_running());
    assert!(matches!(
        session.start_running(),
        Err(CaptureError::AlreadyStarted)
    ));

    let batch = rx.recv().await.expect("detection batch");
    assert_eq!(batch, vec![valued_code(Symbology::Ean13, "4006381333931")]);

    frames.changed().await.expect("frame published");
    {
        let frame = frames.borrow_and_update();
        let frame = frame.as_ref().expect("latest frame present");
        assert_eq!((frame.width, frame.height), (640, 480));
        assert_eq!(frame.luma.len(), 640 * 480);
    }

    loop {
        match events.recv().await.expect("session event") {
            SessionEvent::StreamEnded => break,
            SessionEvent::Started | SessionEvent::Stopped => {}
            SessionEvent::StreamFailed { reason } => panic!("stream failed: {reason}"),
        }
    }
    assert_eq!(
        events.recv().await.expect("final event"),
        SessionEvent::Stopped
    );
    assert!(!session.is_running());
}

#[tokio::test]
async fn stop_running_halts_the_pump() {
    let device = TestPatternDevice::new(vec!["96385074".into()]).with_fps(200);
    let engine = ScriptedEngine::repeating_code(Symbology::Ean8, "96385074");
    let mut output = MetadataOutput::new(Box::new(engine));
    output.set_symbologies(&[Symbology::Ean8]).expect("filter");
    let (tx, mut rx) = mpsc::unbounded_channel();
    output.set_metadata_delegate(tx);

    let mut session = CaptureSession::new();
    session
        .add_input(CaptureInput::from_device(&device).expect("connect"))
        .expect("input");
    session.add_output(output).expect("output");
    session.start_running().expect("start");

    rx.recv().await.expect("scanning is live");
    session.stop_running();
    assert!(!session.is_running());
}

#[test]
fn aspect_fill_crops_the_overflowing_axis() {
    let session = CaptureSession::new();
    let mut preview = PreviewSurface::attached_to(&session);
    preview.set_bounds(SurfaceBounds::new(100, 100));

    let wide = preview.crop_region(200, 100);
    assert!((wide.u_min - 0.25).abs() < f32::EPSILON);
    assert!((wide.u_max - 0.75).abs() < f32::EPSILON);
    assert_eq!((wide.v_min, wide.v_max), (0.0, 1.0));

    let tall = preview.crop_region(100, 200);
    assert_eq!((tall.u_min, tall.u_max), (0.0, 1.0));
    assert!((tall.v_min - 0.25).abs() < f32::EPSILON);
    assert!((tall.v_max - 0.75).abs() < f32::EPSILON);

    preview.set_gravity(VideoGravity::ResizeAspect);
    let fit = preview.crop_region(200, 100);
    assert_eq!((fit.u_min, fit.v_min, fit.u_max, fit.v_max), (0.0, 0.0, 1.0, 1.0));

    preview.set_bounds(SurfaceBounds::default());
    preview.set_gravity(VideoGravity::ResizeAspectFill);
    let degenerate = preview.crop_region(200, 100);
    assert_eq!(
        (degenerate.u_min, degenerate.v_min, degenerate.u_max, degenerate.v_max),
        (0.0, 0.0, 1.0, 1.0)
    );
}
