//! Integration tests for the async session runtime.

use ecg_risk_monitor::config::Config;
use ecg_risk_monitor::core::HealthLevel;
use ecg_risk_monitor::session::{MonitorSession, SessionState};
use ecg_risk_monitor::transport::{
    synthetic_ecg, ScriptedChunk, ScriptedTransport, SyntheticEcg, TransportError,
};
use std::time::Duration;

fn chunks(lines: &[&str]) -> Vec<ScriptedChunk> {
    lines
        .iter()
        .map(|l| ScriptedChunk::new(Duration::from_millis(10), *l))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_connect_enters_calibration_then_monitoring() {
    let transport = ScriptedTransport::new(chunks(&["0.1,0.2\n", "0.2,0.3\n"])).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    assert_eq!(session.state().await, SessionState::Disconnected);
    session.connect().await.expect("connect");
    assert_eq!(session.state().await, SessionState::Calibrating);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(session.state().await, SessionState::Calibrating);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(session.state().await, SessionState::Monitoring);

    let frame = session.frame().await;
    assert_eq!(frame.lead_i, vec![0.1, 0.2]);
    assert_eq!(frame.lead_ii, vec![0.2, 0.3]);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_device_bpm_ends_calibration_early() {
    let transport = ScriptedTransport::new(chunks(&["0.1,0.2\n", "0.1,0.2,72\n"])).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(session.state().await, SessionState::Monitoring);
    assert_eq!(session.diagnostics().await.last_bpm, Some(72));

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_completion_status_ends_calibration_early() {
    let transport = ScriptedTransport::new(chunks(&[
        "Calibration Starting\n",
        "Calibration Complete\n",
    ]))
    .hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(session.state().await, SessionState::Monitoring);
    assert!(session.frame().await.lead_i.is_empty());
    assert_eq!(session.stats().stats().status_lines, 2);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_chunk_boundary_inside_field() {
    let transport = ScriptedTransport::new(vec![
        ScriptedChunk::now("0.1,0."),
        ScriptedChunk::new(Duration::from_millis(50), "2,70\n"),
    ])
    .hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let frame = session.frame().await;
    assert_eq!(frame.lead_i, vec![0.1]);
    assert_eq!(frame.lead_ii, vec![0.2]);
    assert_eq!(session.stats().stats().readings_accepted, 1);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_scores_published_every_second() {
    let params = SyntheticEcg {
        heart_rate: 160,
        irregularity: 0.8,
        duration: Duration::from_secs(6),
        ..SyntheticEcg::default()
    };
    let transport = ScriptedTransport::new(synthetic_ecg(&params)).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);
    let mut assessments = session.subscribe_assessments();

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_millis(5500)).await;

    let computed = session.stats().stats().assessments_computed;
    // Immediate first tick plus one per elapsed second
    assert!((5..=7).contains(&computed), "computed {computed}");

    assert!(assessments.has_changed().unwrap());
    let latest = assessments.borrow_and_update().clone();
    assert_eq!(latest.breakdown.tachy_points, 40);
    assert_eq!(latest.breakdown.irregularity_points, 32);
    assert_eq!(latest.level, HealthLevel::High);
    assert_eq!(session.state().await, SessionState::Monitoring);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_render_frames_published() {
    let transport = ScriptedTransport::new(chunks(&["1.0,2.0\n"])).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);
    let mut frames = session.subscribe_frames();

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(frames.has_changed().unwrap());
    let frame = frames.borrow_and_update().clone();
    assert_eq!(frame.lead_ii, vec![2.0]);
    assert_eq!(frame.state, SessionState::Calibrating);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_keeps_session_disconnected() {
    let mut transport = ScriptedTransport::new(chunks(&["0.1,0.2\n"]));
    transport.fail_next_open(TransportError::OpenFailure("device busy".to_string()));
    let mut session = MonitorSession::new(Config::default(), transport);

    let result = session.connect().await;
    assert!(matches!(result, Err(TransportError::OpenFailure(_))));
    assert_eq!(session.state().await, SessionState::Disconnected);
    assert!(session.session_id().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_interrupts_silent_device() {
    let transport = ScriptedTransport::new(Vec::new()).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_secs(1)).await;

    tokio::time::timeout(Duration::from_millis(100), session.disconnect())
        .await
        .expect("disconnect should not wait for the device");
    assert_eq!(session.state().await, SessionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_right_after_connect() {
    let transport = ScriptedTransport::new(Vec::new()).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    session.connect().await.expect("connect");
    tokio::time::timeout(Duration::from_secs(1), session.disconnect())
        .await
        .expect("disconnect before the tasks first run");
    assert_eq!(session.state().await, SessionState::Disconnected);
    assert!(session.session_id().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_connects() {
    let transport = ScriptedTransport::new(Vec::new()).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    let first = session.connect().await.expect("connect");
    let second = tokio::time::timeout(Duration::from_secs(1), session.connect())
        .await
        .expect("second connect should not hang")
        .expect("reconnect");

    assert_ne!(first, second);
    assert_eq!(session.session_id(), Some(second));
    assert_eq!(session.state().await, SessionState::Calibrating);
    assert_eq!(session.transport().open_count(), 2);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_read_failure_ends_session() {
    let transport = ScriptedTransport::new(chunks(&["0.1,0.2,72,0.1\n", "0.2,0.3,74,0.1\n"]))
        .fail_read_at_end();
    let mut session = MonitorSession::new(Config::default(), transport);
    let mut assessments = session.subscribe_assessments();

    let id = session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(session.state().await, SessionState::Disconnected);
    assert!(session.session_id().is_none());
    {
        let monitor = session.monitor();
        let monitor = monitor.read().await;
        assert!(monitor.store().is_empty());
        assert!(monitor.assessment().is_insufficient());
        assert_eq!(monitor.diagnostics().last_bpm, None);
    }
    assert!(assessments.borrow_and_update().is_insufficient());
    assert_eq!(session.stats().stats().readings_accepted, 2);

    // Reaping the dead session is prompt and a new one can start
    tokio::time::timeout(Duration::from_millis(100), session.disconnect())
        .await
        .expect("disconnect after failure");
    let next = session.connect().await.expect("reconnect");
    assert_ne!(next, id);
    assert_eq!(session.state().await, SessionState::Calibrating);

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_stream_end_flushes_partial_line() {
    let transport = ScriptedTransport::new(chunks(&["0.1,0.2\n", "0.3,0.4"]));
    let mut session = MonitorSession::new(Config::default(), transport);

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let frame = session.frame().await;
    assert_eq!(frame.lead_i, vec![0.1, 0.3]);
    // Stream end is not a failure
    assert!(session.state().await.is_connected());

    session.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_resets_everything() {
    let params = SyntheticEcg {
        heart_rate: 45,
        duration: Duration::from_secs(4),
        ..SyntheticEcg::default()
    };
    let transport = ScriptedTransport::new(synthetic_ecg(&params)).hold_open();
    let mut session = MonitorSession::new(Config::default(), transport);

    session.connect().await.expect("connect");
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!session.frame().await.lead_i.is_empty());
    assert!(!session.assessment().await.is_insufficient());

    session.disconnect().await;
    assert_eq!(session.state().await, SessionState::Disconnected);

    session.connect().await.expect("reconnect");
    assert_eq!(session.state().await, SessionState::Calibrating);

    let monitor = session.monitor();
    {
        let monitor = monitor.read().await;
        assert!(monitor.store().is_empty());
        assert!(monitor.assessment().is_insufficient());
        assert_eq!(monitor.diagnostics().last_bpm, None);
    }
    assert_eq!(session.transport().open_count(), 2);

    session.disconnect().await;
}
