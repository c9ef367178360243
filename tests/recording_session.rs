//! Recording Session Integration Tests
//!
//! Exercises the countdown state machine through the public API:
//! time-box expiry, manual stop, and failure paths.

use braindump::capture::{CaptureError, MockAudioSource, RecordingSession, Tick};
use tempfile::TempDir;

fn session_with_limit(limit_secs: u32, temp: &TempDir) -> RecordingSession {
    RecordingSession::new(
        Box::new(MockAudioSource::new().with_samples(vec![42i16; 1600])),
        limit_secs,
        temp.path().join("recordings"),
    )
}

#[test]
fn countdown_triggers_exactly_one_auto_stop_at_ceiling() {
    let temp = TempDir::new().unwrap();
    let mut session = session_with_limit(5, &temp);
    session.start().unwrap();

    let mut auto_stops = 0;
    let mut running_ticks = 0;

    // Drive well past the ceiling
    for _ in 0..10 {
        match session.tick().unwrap() {
            Tick::Running { .. } => running_ticks += 1,
            Tick::Finished(clip) => {
                auto_stops += 1;
                assert!(clip.path.exists());
            }
            Tick::Idle => {}
        }
    }

    assert_eq!(running_ticks, 4, "ceiling T yields T-1 running ticks");
    assert_eq!(auto_stops, 1, "auto-stop fires exactly once at elapsed time T");
    assert!(!session.is_recording());
}

#[test]
fn no_countdown_activity_after_auto_stop() {
    let temp = TempDir::new().unwrap();
    let mut session = session_with_limit(2, &temp);
    session.start().unwrap();

    session.tick().unwrap();
    assert!(matches!(session.tick().unwrap(), Tick::Finished(_)));

    // The timer is cleared: every further tick observes an idle session
    for _ in 0..3 {
        assert!(matches!(session.tick().unwrap(), Tick::Idle));
    }
    assert!(session.remaining_secs().is_none());
}

#[test]
fn quick_flow_ceiling() {
    let temp = TempDir::new().unwrap();
    let mut session = session_with_limit(10, &temp);
    session.start().unwrap();

    assert_eq!(session.remaining_secs(), Some(10));

    for expected in (1..10).rev() {
        match session.tick().unwrap() {
            Tick::Running { remaining_secs } => assert_eq!(remaining_secs, expected),
            other => panic!("expected Running, got {:?}", other),
        }
    }
    assert!(matches!(session.tick().unwrap(), Tick::Finished(_)));
}

#[test]
fn manual_stop_cancels_the_countdown() {
    let temp = TempDir::new().unwrap();
    let mut session = session_with_limit(120, &temp);
    session.start().unwrap();

    session.tick().unwrap();
    session.tick().unwrap();
    assert_eq!(session.remaining_secs(), Some(118));

    let clip = session.stop().unwrap().expect("clip");
    assert!(clip.path.exists());
    assert!(matches!(session.tick().unwrap(), Tick::Idle));
}

#[test]
fn session_is_reusable_after_stop() {
    let temp = TempDir::new().unwrap();
    let mut session = session_with_limit(3, &temp);

    session.start().unwrap();
    let first = session.stop().unwrap().expect("clip");

    session.start().unwrap();
    assert_eq!(session.remaining_secs(), Some(3), "countdown re-arms at the ceiling");
    let second = session.stop().unwrap().expect("clip");

    assert_ne!(first.path, second.path, "each recording gets its own file");
}

#[test]
fn permission_denied_is_reported_and_session_stays_idle() {
    let temp = TempDir::new().unwrap();
    let mut session = RecordingSession::new(
        Box::new(MockAudioSource::new().with_permission_denied()),
        120,
        temp.path(),
    );

    assert!(matches!(
        session.start(),
        Err(CaptureError::Permission { .. })
    ));
    assert!(!session.is_recording());

    // Failed start is recoverable at the session level: stop stays a no-op
    assert!(session.stop().unwrap().is_none());
}

#[test]
fn finalize_failure_produces_no_clip() {
    let temp = TempDir::new().unwrap();
    let out_dir = temp.path().join("recordings");
    let mut session = RecordingSession::new(
        Box::new(MockAudioSource::new().with_stop_failure()),
        120,
        &out_dir,
    );
    session.start().unwrap();

    assert!(session.stop().is_err());
    assert!(!out_dir.exists(), "no file is written on the failure path");
}
