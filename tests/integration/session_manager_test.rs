//! Thread Session Manager Integration Tests

use agui_bridge::models::session::SessionState;
use agui_bridge::{AguiEvent, BridgeConfig, ThreadSessionManager};
use serde_json::json;

const INIT: &str = r#"{"type":"system","subtype":"init","session_id":"sess_42"}"#;
const TEXT: &str = r#"{"type":"assistant","message":{"id":"m1","content":"plain reply"}}"#;

// ============================================================================
// Broadcast fan-out
// ============================================================================

#[tokio::test]
async fn test_subscribers_receive_run_events() {
    let manager = ThreadSessionManager::with_capacity(32);
    manager.open_thread(Some("t1")).await;
    let mut first = manager.subscribe("t1").await.unwrap();
    let mut second = manager.subscribe("t1").await.unwrap();

    manager
        .start_run("t1", Some(json!({"prompt": "hi"})))
        .await
        .unwrap();
    manager.ingest_line("t1", TEXT).await.unwrap();
    manager.finish_run("t1").await.unwrap();

    for rx in [&mut first, &mut second] {
        let mut types = Vec::new();
        while let Ok(event) = rx.try_recv() {
            types.push(event.event_type());
        }
        assert_eq!(
            types,
            vec!["RUN_STARTED", "TEXT_MESSAGE_CONTENT", "RUN_FINISHED"]
        );
    }
}

#[tokio::test]
async fn test_no_subscribers_is_fine() {
    let manager = ThreadSessionManager::new();
    manager.open_thread(Some("t1")).await;
    let event = manager.start_run("t1", None).await.unwrap();
    assert!(matches!(event, AguiEvent::RunStarted { .. }));
    assert_eq!(manager.get_thread("t1").await.unwrap().event_count, 1);
}

// ============================================================================
// Thread info
// ============================================================================

#[tokio::test]
async fn test_thread_info_tracks_session_and_run() {
    let manager = ThreadSessionManager::new();
    manager.open_thread(Some("t1")).await;

    let run_id = match manager.start_run("t1", None).await.unwrap() {
        AguiEvent::RunStarted { run_id, .. } => run_id,
        other => panic!("Expected RunStarted, got {:?}", other),
    };
    manager.ingest_line("t1", INIT).await.unwrap();

    let info = manager.get_thread("t1").await.unwrap();
    assert_eq!(info.thread_id, "t1");
    assert_eq!(info.session_id.as_deref(), Some("sess_42"));
    assert_eq!(info.run_id.as_deref(), Some(run_id.as_str()));
    assert_eq!(info.state, SessionState::Running);
    assert_eq!(info.run_count, 1);
}

#[tokio::test]
async fn test_threads_are_independent() {
    let manager = ThreadSessionManager::new();
    manager.open_thread(Some("a")).await;
    manager.open_thread(Some("b")).await;
    manager.start_run("a", None).await.unwrap();

    manager.ingest_line("a", TEXT).await.unwrap();
    assert!(manager.ingest_line("b", TEXT).await.is_err());

    let threads = manager.list_threads().await;
    assert_eq!(threads.len(), 2);
    let state_of = |id: &str| threads.iter().find(|t| t.thread_id == id).map(|t| t.state);
    assert_eq!(state_of("a"), Some(SessionState::Running));
    assert_eq!(state_of("b"), Some(SessionState::Idle));
}

#[tokio::test]
async fn test_rerun_after_finish() {
    let manager = ThreadSessionManager::new();
    manager.open_thread(Some("t1")).await;
    manager.start_run("t1", None).await.unwrap();
    manager.finish_run("t1").await.unwrap();

    manager.start_run("t1", None).await.unwrap();
    let info = manager.get_thread("t1").await.unwrap();
    assert_eq!(info.run_count, 2);
    assert_eq!(info.state, SessionState::Running);
}

#[tokio::test]
async fn test_malformed_line_leaves_run_open() {
    let manager = ThreadSessionManager::new();
    manager.open_thread(Some("t1")).await;
    manager.start_run("t1", None).await.unwrap();

    assert!(manager.ingest_line("t1", "<html>").await.is_err());
    assert_eq!(
        manager.get_thread("t1").await.unwrap().state,
        SessionState::Running
    );
}

#[tokio::test]
async fn test_rerun_after_streamed_turn_converts_batch() {
    let manager = ThreadSessionManager::new();
    manager.open_thread(Some("t1")).await;
    manager.start_run("t1", None).await.unwrap();
    for line in [
        r#"{"type":"stream_event","event":{"type":"message_start","message":{"id":"msg_1"}}}"#,
        r#"{"type":"stream_event","event":{"type":"message_stop"}}"#,
    ] {
        manager.ingest_line("t1", line).await.unwrap();
    }
    manager.finish_run("t1").await.unwrap();

    manager.start_run("t1", None).await.unwrap();
    let events = manager.ingest_line("t1", TEXT).await.unwrap();
    let types: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types, vec!["TEXT_MESSAGE_CONTENT"]);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_broadcast_capacity_from_config() {
    let config = BridgeConfig {
        broadcast_capacity: 2,
        ..Default::default()
    };
    let manager = ThreadSessionManager::from_config(&config);
    assert_eq!(manager.broadcast_capacity(), 2);

    manager.open_thread(Some("t1")).await;
    let mut rx = manager.subscribe("t1").await.unwrap();
    manager.start_run("t1", None).await.unwrap();
    // One batch tool call yields three events; four exceed the buffer
    manager
        .ingest_line(
            "t1",
            r#"{"type":"assistant","message":{"id":"m1","content":[{"type":"tool_use","id":"t1","name":"search","input":{}}]}}"#,
        )
        .await
        .unwrap();

    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Lagged(2))
    ));
}

#[tokio::test]
async fn test_default_manager_uses_default_capacity() {
    let manager = ThreadSessionManager::new();
    assert_eq!(
        manager.broadcast_capacity(),
        BridgeConfig::default().broadcast_capacity
    );
}
