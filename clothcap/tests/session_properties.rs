use std::sync::Arc;
use std::time::Duration;

use clothcap::prelude::*;
use clothcap::videoio::StreamState;
use clothcap_simulation::{SimCamera, SimDriver, SimEvent, SimProbe, TorchSupport};

fn phone_session() -> (CaptureSession, SimProbe) {
    let driver = SimDriver::phone();
    let probe = driver.probe();
    (
        CaptureSession::new(Arc::new(driver), SessionConfig::default()),
        probe,
    )
}

#[tokio::test(start_paused = true)]
async fn overlapping_reconfigurations_never_hold_two_streams() {
    let driver = SimDriver::phone();
    driver.set_open_latency(Duration::from_millis(40));
    let probe = driver.probe();
    let ctl = CameraController::new(Arc::new(driver), SessionConfig::default().camera_config());

    ctl.start(Facing::Rear).await.unwrap();
    let (a, b, _torch, c) = tokio::join!(
        ctl.switch_facing(),
        ctl.switch_facing(),
        ctl.set_illumination(true),
        ctl.switch_facing(),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert_eq!(probe.peak_open_streams(), 1);
    assert_eq!(probe.open_streams(), 1);
    assert_eq!(ctl.status().facing, Facing::Front);
    assert_eq!(ctl.status().state, StreamState::Open);
}

#[tokio::test(start_paused = true)]
async fn spawned_reconfigurations_serialize() {
    let driver = SimDriver::phone();
    driver.set_open_latency(Duration::from_millis(10));
    let probe = driver.probe();
    let ctl = Arc::new(CameraController::new(
        Arc::new(driver),
        SessionConfig::default().camera_config(),
    ));

    let mut tasks = Vec::new();
    for i in 0..6 {
        let ctl = ctl.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                ctl.start(Facing::Rear).await
            } else {
                ctl.switch_facing().await
            }
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    assert_eq!(probe.peak_open_streams(), 1);
    assert_eq!(probe.opens(), 6);
    assert_eq!(probe.closes(), 5);
}

#[tokio::test]
async fn stop_twice_is_a_no_op() {
    let (session, probe) = phone_session();
    session.start_camera().await.unwrap();

    session.stop_camera().await;
    let closes = probe.closes();
    session.stop_camera().await;

    assert_eq!(probe.closes(), closes);
    assert_eq!(session.status().state, StreamState::Closed);
}

#[tokio::test]
async fn capture_while_closed_leaves_pending_untouched() {
    let (mut session, _probe) = phone_session();

    let err = session.capture_photo().await.unwrap_err();
    assert!(matches!(err, SessionError::NoActiveStream));
    assert!(session.pending().is_none());
}

#[tokio::test]
async fn torch_on_front_camera_is_unsupported() {
    let (session, probe) = phone_session();
    session.start_facing(Facing::Front).await.unwrap();
    let opens = probe.opens();

    let err = session.set_torch(true).await.unwrap_err();

    assert!(matches!(err, SessionError::CapabilityUnsupported(_)));
    assert!(!session.status().illumination_requested);
    assert!(!session.status().illumination_supported);
    assert_eq!(probe.opens(), opens);
}

#[tokio::test]
async fn commits_export_in_order() {
    let (mut session, _probe) = phone_session();
    session.start_camera().await.unwrap();

    for supplier in ["S1", "S2", "S3", "S4"] {
        session.capture_photo().await.unwrap();
        session.set_field("supplierId", supplier).unwrap();
        session.save_entry();
    }

    let sink = MemorySink::new();
    let doc = session.export(&sink).unwrap();
    let parsed = parse_document(&doc.bytes).unwrap();

    let ids: Vec<_> = parsed
        .iter()
        .map(|e| e.supplier_id.clone().unwrap_or_default())
        .collect();
    assert_eq!(ids, ["S1", "S2", "S3", "S4"]);
}

#[tokio::test]
async fn export_round_trip_is_lossless() {
    let (mut session, _probe) = phone_session();
    session.start_camera().await.unwrap();

    let forms = [
        ("Nike", "S", "Kids", "A-1"),
        ("Adidas", "L", "Women", ""),
        ("", "", "", ""),
        ("Nike", "M", "", "B 2"),
    ];
    for (i, (brand, size, ga, supplier)) in forms.iter().enumerate() {
        if i != 2 {
            session.capture_photo().await.unwrap();
        }
        session.set_field("brand", brand).unwrap();
        session.set_field("size", size).unwrap();
        session.set_field("genderAge", ga).unwrap();
        session.set_field("supplierId", supplier).unwrap();
        session.save_entry();
    }

    let doc = session.export(&MemorySink::new()).unwrap();
    let parsed = parse_document(&doc.bytes).unwrap();

    assert_eq!(parsed.len(), forms.len());
    assert_eq!(parsed.as_slice(), session.catalog().entries());
    assert!(parsed[2].image.is_none());
    assert_eq!(parsed[0].image.as_ref().unwrap().dimensions().unwrap(), (320, 240));
}

#[tokio::test]
async fn nike_medium_men_scenario() {
    let (mut session, _probe) = phone_session();
    session.start_facing(Facing::Rear).await.unwrap();
    session.capture_photo().await.unwrap();

    session.set_field("brand", "Nike").unwrap();
    session.set_field("size", "M").unwrap();
    session.set_field("genderAge", "Men").unwrap();
    session.set_field("supplierId", "S100").unwrap();
    let entry = session.save_entry().clone();

    assert_eq!(session.catalog().len(), 1);
    assert_eq!(entry.brand, Some(Brand::Nike));
    assert_eq!(entry.size, Some(Size::M));
    assert_eq!(entry.gender_age, Some(GenderAge::Men));
    assert_eq!(entry.supplier_id.as_deref(), Some("S100"));
    assert!(entry.image.is_some());

    assert!(session.draft().is_empty());
    assert!(session.pending().is_none());
}

#[tokio::test]
async fn switch_facing_is_one_stop_and_reacquire() {
    let (session, probe) = phone_session();
    session.start_facing(Facing::Rear).await.unwrap();
    probe.clear_events();

    session.switch_camera().await.unwrap();

    let events = probe.events();
    assert_eq!(events.len(), 2, "{events:?}");
    assert!(matches!(events[0], SimEvent::Closed { .. }));
    assert!(matches!(
        events[1],
        SimEvent::Opened {
            facing: Facing::Front,
            ..
        }
    ));
    assert_eq!(session.status().facing, Facing::Front);
    assert_eq!(probe.open_streams(), 1);
}

#[tokio::test]
async fn failed_start_then_capture() {
    let driver = SimDriver::phone();
    driver.deny_permission(true);
    let mut session = CaptureSession::new(Arc::new(driver), SessionConfig::default());

    let err = session.start_camera().await.unwrap_err();
    assert!(matches!(err, SessionError::DeviceUnavailable { .. }));

    let err = session.capture_photo().await.unwrap_err();
    assert!(matches!(err, SessionError::NoActiveStream));
    assert!(session.catalog().is_empty());
}

#[tokio::test]
async fn retry_after_denied_permission() {
    let driver = Arc::new(SimDriver::phone());
    driver.deny_permission(true);
    let session = CaptureSession::new(driver.clone(), SessionConfig::default());
    assert!(session.start_camera().await.is_err());

    driver.deny_permission(false);
    session.start_camera().await.unwrap();
    assert_eq!(session.status().state, StreamState::Open);
}

#[tokio::test]
async fn reopen_torch_reacquires_with_new_request() {
    let driver = SimDriver::new(vec![
        SimCamera::new("Rear", Facing::Rear).torch(TorchSupport::OnOpen),
        SimCamera::new("Front", Facing::Front),
    ]);
    let probe = driver.probe();
    let session = CaptureSession::new(Arc::new(driver), SessionConfig::default());
    session.start_camera().await.unwrap();
    probe.clear_events();

    session.set_torch(true).await.unwrap();

    assert_eq!(probe.opens(), 1);
    assert_eq!(probe.closes(), 1);
    assert_eq!(
        probe.events().last(),
        Some(&SimEvent::Opened {
            device: "sim:0".into(),
            facing: Facing::Rear,
            torch: true,
        })
    );
    assert!(session.status().illumination_requested);
    assert_eq!(probe.peak_open_streams(), 1);
}

#[tokio::test]
async fn live_torch_stays_on_the_same_track() {
    let (session, probe) = phone_session();
    session.start_camera().await.unwrap();
    probe.clear_events();

    session.set_torch(true).await.unwrap();
    session.set_torch(false).await.unwrap();

    assert_eq!(probe.opens(), 0);
    assert_eq!(probe.closes(), 0);
    assert!(!session.status().illumination_requested);
}

#[tokio::test]
async fn export_into_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let config = SessionConfig {
        output_dir: tmp.path().to_path_buf(),
        ..SessionConfig::default()
    };
    let mut session = CaptureSession::new(Arc::new(SimDriver::phone()), config);
    session.start_camera().await.unwrap();
    session.capture_photo().await.unwrap();
    session.save_entry();

    let sink = DirectorySink::new(&session.config().output_dir);
    let doc = session.export(&sink).unwrap();

    let on_disk = std::fs::read(tmp.path().join("clothing-data.json")).unwrap();
    assert_eq!(on_disk, doc.bytes);
    let value: serde_json::Value = serde_json::from_slice(&on_disk).unwrap();
    assert!(value[0]["image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
}
