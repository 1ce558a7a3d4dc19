use blink_unlock::synthetic::{synthetic_face, ScriptedCamera, ScriptedVision};
use blink_unlock::{
    BootError, BootPhase, CameraError, ControlEvent, EyelidPair, RecordingSurface, Session, StatusMessage, UnlockConfig,
    UnlockState, VideoMetadata, VisionError, FACE_MESH,
};
use tokio::sync::mpsc;

type TestSession = Session<ScriptedVision, ScriptedCamera, RecordingSurface>;

fn session_with(vision: ScriptedVision, camera: ScriptedCamera) -> TestSession {
    Session::new(UnlockConfig::default(), vision, camera, RecordingSurface::new()).unwrap()
}

/// Runs the frame loop to completion with no manual events.
async fn run_to_end(session: &mut TestSession) -> blink_unlock::RunSummary {
    let (tx, mut rx) = mpsc::unbounded_channel();
    drop(tx);
    session.run(&mut rx).await
}

#[tokio::test]
async fn boot_walks_loading_ready_active_in_order() {
    let mut session = session_with(ScriptedVision::new(), ScriptedCamera::new(1280, 720, 0));
    let metadata = session.boot().await.unwrap();

    assert_eq!(metadata, VideoMetadata { width: 1280, height: 720 });
    assert_eq!(session.phase(), &BootPhase::Active(metadata));

    let surface = session.controller().surface();
    assert_eq!(
        surface.statuses,
        vec![StatusMessage::Loading, StatusMessage::Ready, StatusMessage::CameraActive]
    );
    assert!(surface.video_visible);
    assert_eq!(surface.canvas_size, Some((1280, 720)));
    assert_eq!(session.controller().canvas().dimensions(), (1280, 720));

    let (vision, camera, _) = session.into_parts();
    assert!(vision.configured.as_ref().unwrap().refine_landmarks);
    assert_eq!(vision.configured.unwrap().max_faces, 1);
    assert_eq!(camera.requested.unwrap().width, 640);
}

#[tokio::test]
async fn blink_below_threshold_unlocks_once() {
    let vision = ScriptedVision::from_openings(&FACE_MESH, &[0.02, 0.003, 0.001, 0.02, 0.002]);
    let mut session = session_with(vision, ScriptedCamera::new(64, 48, 5));
    session.boot().await.unwrap();

    let summary = run_to_end(&mut session).await;

    assert_eq!(summary.frames_processed, 5);
    assert!(session.is_unlocked());
    let surface = session.controller().surface();
    assert_eq!(surface.reveal_count, 1);
    assert!(surface.status_text().contains("detected"));
    assert_eq!(
        session.controller().unlock_state(),
        &UnlockState::Unlocked { reason: "gesture".into() }
    );
    assert_eq!(surface.revealed.as_ref().unwrap().accent, "#d4edda");
}

#[tokio::test]
async fn open_eyes_never_unlock() {
    let openings: Vec<f64> = (0..50).map(|i| 0.0085 + i as f64 * 0.0005).collect();
    let vision = ScriptedVision::from_openings(&FACE_MESH, &openings);
    let mut session = session_with(vision, ScriptedCamera::new(64, 48, openings.len() as u64));
    session.boot().await.unwrap();

    let summary = run_to_end(&mut session).await;

    assert_eq!(summary.frames_processed, 50);
    assert!(!session.is_unlocked());
    assert!(session.controller().surface().revealed.is_none());
    assert!(matches!(
        session.controller().surface().last_status(),
        Some(StatusMessage::Calibration { .. })
    ));
}

#[tokio::test]
async fn readout_scenario_shows_four_decimals() {
    let vision = ScriptedVision::from_openings(&FACE_MESH, &[0.02]);
    let mut session = session_with(vision, ScriptedCamera::new(64, 48, 1));
    session.boot().await.unwrap();
    run_to_end(&mut session).await;

    assert!(!session.is_unlocked());
    assert!(session.controller().surface().status_text().contains("0.0200"));
}

#[tokio::test]
async fn manual_unlock_wins_and_is_idempotent() {
    let vision = ScriptedVision::from_openings(&FACE_MESH, &[0.001]);
    let mut session = session_with(vision, ScriptedCamera::new(64, 48, 1));
    session.boot().await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    tx.send(ControlEvent::ManualUnlock).unwrap();
    tx.send(ControlEvent::ManualUnlock).unwrap();
    drop(tx);
    let summary = session.run(&mut rx).await;

    // Control events are served before the camera, so the button beats the blink.
    assert_eq!(summary.control_events, 2);
    assert_eq!(
        session.controller().unlock_state(),
        &UnlockState::Unlocked { reason: "manual".into() }
    );
    assert_eq!(session.controller().surface().reveal_count, 1);
    assert!(session.controller().surface().status_text().starts_with("manual detected"));
}

#[tokio::test]
async fn camera_failure_reports_error_and_keeps_manual_path() {
    let mut session = session_with(ScriptedVision::new(), ScriptedCamera::failing(CameraError::PermissionDenied));

    let err = session.boot().await.unwrap_err();
    assert_eq!(err, BootError::Camera(CameraError::PermissionDenied));
    assert!(matches!(session.phase(), BootPhase::Failed(_)));
    assert!(!session.is_unlocked());

    let status = session.controller().surface().last_status().unwrap().clone();
    assert!(status.is_error());
    assert!(status.to_string().contains("Error"));
    assert!(!session.controller().surface().video_visible);

    assert!(session.manual_unlock());
    assert!(!session.manual_unlock());
    assert!(session.is_unlocked());
}

#[tokio::test]
async fn unsupported_camera_has_its_own_message() {
    let mut session = session_with(ScriptedVision::new(), ScriptedCamera::failing(CameraError::Unsupported));
    session.boot().await.unwrap_err();
    assert_eq!(session.controller().surface().last_status(), Some(&StatusMessage::Unsupported));
}

#[tokio::test]
async fn failed_session_still_serves_the_button() {
    let mut session = session_with(ScriptedVision::new(), ScriptedCamera::failing(CameraError::Unavailable("no device".into())));
    session.boot().await.unwrap_err();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let button = tokio::spawn(async move {
        tx.send(ControlEvent::ManualUnlock).unwrap();
    });
    let summary = session.run(&mut rx).await;
    button.await.unwrap();

    assert_eq!(summary.frames_processed, 0);
    assert_eq!(summary.control_events, 1);
    assert!(session.is_unlocked());
}

#[tokio::test]
async fn vision_configuration_failure_never_starts_the_camera() {
    let vision = ScriptedVision::failing_configuration(VisionError::Configuration("model missing".into()));
    let mut session = session_with(vision, ScriptedCamera::new(64, 48, 3));

    let err = session.boot().await.unwrap_err();
    assert!(matches!(err, BootError::Vision(_)));
    assert!(session.controller().surface().status_text().contains("model missing"));

    let (_, camera, _) = session.into_parts();
    assert_eq!(camera.start_calls, 0);
}

#[tokio::test]
async fn inference_errors_skip_the_frame_only() {
    let mut vision = ScriptedVision::new();
    vision
        .push_error(VisionError::Inference("bad frame".into()))
        .push_faces(vec![synthetic_face(&FACE_MESH, 0.001)]);
    let mut session = session_with(vision, ScriptedCamera::new(64, 48, 2));
    session.boot().await.unwrap();

    let summary = run_to_end(&mut session).await;

    assert_eq!(summary.frames_skipped, 1);
    assert_eq!(summary.frames_processed, 1);
    assert!(session.is_unlocked());
}

#[tokio::test]
async fn stream_error_mid_run_falls_back_to_manual() {
    let vision = ScriptedVision::from_openings(&FACE_MESH, &[0.02, 0.02, 0.02]);
    let camera = ScriptedCamera::new(64, 48, 10).with_stream_error(2, CameraError::Stream("unplugged".into()));
    let mut session = session_with(vision, camera);
    session.boot().await.unwrap();

    let summary = run_to_end(&mut session).await;

    assert_eq!(summary.frames_processed, 2);
    assert!(matches!(session.phase(), BootPhase::Failed(BootError::Camera(CameraError::Stream(_)))));
    let status = session.controller().surface().last_status().unwrap().clone();
    assert!(status.is_error());
    assert!(matches!(status, StatusMessage::CameraLost { .. }));
    assert!(status.to_string().starts_with("Camera stopped"), "{status}");
    assert!(status.to_string().contains("unplugged"), "{status}");
    assert!(!session.is_unlocked());
    assert!(session.manual_unlock());
}

#[tokio::test]
async fn unknown_resolution_is_taken_from_the_first_frame() {
    let vision = ScriptedVision::from_openings(&FACE_MESH, &[0.02, 0.02]);
    let camera = ScriptedCamera::new(48, 36, 2).with_reported_size(0, 0);
    let mut session = session_with(vision, camera);

    let metadata = session.boot().await.unwrap();
    assert!(!metadata.is_known());
    assert_eq!(session.controller().surface().canvas_size, None);

    run_to_end(&mut session).await;

    assert_eq!(session.phase(), &BootPhase::Active(VideoMetadata { width: 48, height: 36 }));
    assert_eq!(session.controller().surface().canvas_size, Some((48, 36)));
    assert_eq!(session.controller().canvas().dimensions(), (48, 36));
}

#[tokio::test]
async fn eyelid_override_drives_the_gesture_check() {
    let config = UnlockConfig::from_json_str(r#"{ "eyelids": { "upper": 386, "lower": 374 } }"#).unwrap();
    let eyelids = config.eyelid_pair().unwrap();
    assert_eq!(eyelids, EyelidPair::new(386, 374));

    let vision = ScriptedVision::from_openings_at(&FACE_MESH, eyelids, &[0.02, 0.001]);
    let mut session = Session::new(config, vision, ScriptedCamera::new(64, 48, 2), RecordingSurface::new()).unwrap();
    session.boot().await.unwrap();
    run_to_end(&mut session).await;

    assert_eq!(
        session.controller().unlock_state(),
        &UnlockState::Unlocked { reason: "gesture".into() }
    );
}

#[tokio::test]
async fn zero_face_frames_still_reach_the_canvas() {
    let mut vision = ScriptedVision::new();
    vision.push_faces(Vec::new()).push_faces(Vec::new());
    let mut session = session_with(vision, ScriptedCamera::new(32, 24, 2));
    session.boot().await.unwrap();

    run_to_end(&mut session).await;

    let surface = session.controller().surface();
    assert_eq!(surface.frames_presented, 2);
    assert_eq!(surface.last_status(), Some(&StatusMessage::CameraActive));
}
