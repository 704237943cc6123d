//! Stream Adapter Integration Tests
//!
//! Feeds raw stream-json lines through `ClaudeAgentAdapter` and checks the
//! AGUI events that come out.

use agui_bridge::{AguiEvent, ClaudeAgentAdapter, StreamAdapter};

fn feed(adapter: &mut ClaudeAgentAdapter, lines: &[&str]) -> Vec<AguiEvent> {
    let mut events = Vec::new();
    for line in lines {
        events.extend(adapter.adapt(line).unwrap());
    }
    events
}

fn types(events: &[AguiEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.event_type()).collect()
}

const MESSAGE_START: &str =
    r#"{"type":"stream_event","event":{"type":"message_start","message":{"id":"msg_1","role":"assistant","content":[]}}}"#;
const MESSAGE_STOP: &str = r#"{"type":"stream_event","event":{"type":"message_stop"}}"#;

fn block_start(index: usize, block: &str) -> String {
    format!(
        r#"{{"type":"stream_event","event":{{"type":"content_block_start","index":{},"content_block":{}}}}}"#,
        index, block
    )
}

fn block_delta(index: usize, delta: &str) -> String {
    format!(
        r#"{{"type":"stream_event","event":{{"type":"content_block_delta","index":{},"delta":{}}}}}"#,
        index, delta
    )
}

fn block_stop(index: usize) -> String {
    format!(
        r#"{{"type":"stream_event","event":{{"type":"content_block_stop","index":{}}}}}"#,
        index
    )
}

// ============================================================================
// Ordering and pairing
// ============================================================================

#[test]
fn test_streamed_text_order() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    let events = feed(
        &mut adapter,
        &[
            MESSAGE_START,
            &block_start(0, r#"{"type":"text","text":""}"#),
            &block_delta(0, r#"{"type":"text_delta","text":"hi"}"#),
            &block_stop(0),
            MESSAGE_STOP,
        ],
    );

    assert_eq!(
        types(&events),
        vec!["TEXT_MESSAGE_START", "TEXT_MESSAGE_CONTENT", "TEXT_MESSAGE_END"]
    );
    match &events[1] {
        AguiEvent::TextMessageContent { content, .. } => assert_eq!(content, "hi"),
        other => panic!("Expected TextMessageContent, got {:?}", other),
    }
}

#[test]
fn test_start_end_pairing_with_forced_closure() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    let mut events = feed(
        &mut adapter,
        &[
            MESSAGE_START,
            &block_start(0, r#"{"type":"thinking","thinking":""}"#),
            &block_delta(0, r#"{"type":"thinking_delta","thinking":"hmm"}"#),
            &block_stop(0),
            &block_start(1, r#"{"type":"thinking","thinking":""}"#),
            &block_start(2, r#"{"type":"tool_use","id":"toolu_a","name":"search"}"#),
            &block_delta(2, r#"{"type":"input_json_delta","partial_json":"{\"q\":"}"#),
            &block_start(3, r#"{"type":"tool_use","id":"toolu_b","name":"read"}"#),
            &block_stop(3),
        ],
    );
    events.extend(adapter.finalize());

    let count = |t: &str| events.iter().filter(|e| e.event_type() == t).count();
    assert_eq!(count("THINKING_START"), 2);
    assert_eq!(count("THINKING_START"), count("THINKING_END"));

    for id in ["toolu_a", "toolu_b"] {
        let starts = events
            .iter()
            .filter(|e| matches!(e, AguiEvent::ToolCallStart { tool_call_id, .. } if tool_call_id == id))
            .count();
        let ends = events
            .iter()
            .filter(|e| matches!(e, AguiEvent::ToolCallEnd { tool_call_id, .. } if tool_call_id == id))
            .count();
        assert_eq!(starts, 1, "{} start", id);
        assert_eq!(ends, 1, "{} end", id);
    }

    assert_eq!(events.last().map(|e| e.event_type()), Some("RUN_FINISHED"));
    assert!(!adapter.has_open_spans());
}

// ============================================================================
// Duplicate suppression
// ============================================================================

#[test]
fn test_batch_after_stream_is_suppressed_once() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    feed(
        &mut adapter,
        &[
            MESSAGE_START,
            &block_start(0, r#"{"type":"text","text":""}"#),
            &block_delta(0, r#"{"type":"text_delta","text":"hello"}"#),
            &block_stop(0),
            MESSAGE_STOP,
        ],
    );

    let batch = r#"{"type":"assistant","message":{"id":"msg_1","role":"assistant","content":[{"type":"text","text":"hello"}]}}"#;
    assert!(adapter.adapt(batch).unwrap().is_empty());

    // The flag is one-shot: the next batch message converts normally
    let events = adapter.adapt(batch).unwrap();
    assert_eq!(types(&events), vec!["TEXT_MESSAGE_CONTENT"]);
}

// ============================================================================
// Batch tool calls and results
// ============================================================================

#[test]
fn test_batch_tool_call() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    let line = r#"{"type":"assistant","message":{"id":"m1","content":[{"type":"tool_use","id":"t1","name":"search","input":{"q":"x"}}]}}"#;
    let events = adapter.adapt(line).unwrap();

    assert_eq!(events.len(), 3);
    match &events[0] {
        AguiEvent::ToolCallStart {
            tool_call_id,
            tool_name,
            ..
        } => {
            assert_eq!(tool_call_id, "t1");
            assert_eq!(tool_name, "search");
        }
        other => panic!("Expected ToolCallStart, got {:?}", other),
    }
    match &events[1] {
        AguiEvent::ToolCallArgs { tool_call_id, args, .. } => {
            assert_eq!(tool_call_id, "t1");
            assert_eq!(args, r#"{"q":"x"}"#);
        }
        other => panic!("Expected ToolCallArgs, got {:?}", other),
    }
    match &events[2] {
        AguiEvent::ToolCallEnd { tool_call_id, .. } => assert_eq!(tool_call_id, "t1"),
        other => panic!("Expected ToolCallEnd, got {:?}", other),
    }
}

#[test]
fn test_tool_result_object_content_is_serialized() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    let line = r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":{"a":1}}]}}"#;
    let events = adapter.adapt(line).unwrap();

    assert_eq!(events.len(), 1);
    match &events[0] {
        AguiEvent::ToolCallResult {
            tool_call_id,
            result,
            is_error,
            ..
        } => {
            assert_eq!(tool_call_id, "t1");
            assert_eq!(result, r#"{"a":1}"#);
            assert!(!is_error);
        }
        other => panic!("Expected ToolCallResult, got {:?}", other),
    }
}

// ============================================================================
// Sidechain traffic
// ============================================================================

#[test]
fn test_sidechain_messages_are_dropped() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    let lines = [
        r#"{"type":"assistant","isSidechain":true,"parent_tool_use_id":"toolu_p","message":{"content":[{"type":"text","text":"sub"}]}}"#,
        r#"{"type":"stream_event","is_sidechain":true,"parentToolUseId":"toolu_p","event":{"type":"message_start"}}"#,
        r#"{"type":"error","isSidechain":true,"parent_tool_use_id":"toolu_p","error":"nested"}"#,
    ];
    for line in lines {
        assert!(adapter.adapt(line).unwrap().is_empty(), "{}", line);
    }
    assert!(adapter.current_message_id().is_none());
}

// ============================================================================
// Finalize cleanup
// ============================================================================

#[test]
fn test_finalize_closes_thinking_tool_and_message() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    adapter.create_run_started(None);
    feed(
        &mut adapter,
        &[
            MESSAGE_START,
            &block_start(0, r#"{"type":"thinking","thinking":""}"#),
            &block_start(1, r#"{"type":"tool_use","id":"toolu_x","name":"bash"}"#),
        ],
    );
    assert_eq!(adapter.open_block_count(), 2);

    let events = adapter.finalize();
    assert_eq!(
        types(&events),
        vec!["THINKING_END", "TOOL_CALL_END", "TEXT_MESSAGE_END", "RUN_FINISHED"]
    );
    assert_eq!(adapter.open_block_count(), 0);
    assert!(adapter.current_message_id().is_none());
}

// ============================================================================
// Full run
// ============================================================================

#[test]
fn test_full_run_with_session_init() {
    let mut adapter = ClaudeAgentAdapter::new("T1");

    let run_id = match adapter.create_run_started(None) {
        AguiEvent::RunStarted { thread_id, run_id, .. } => {
            assert_eq!(thread_id, "T1");
            run_id
        }
        other => panic!("Expected RunStarted, got {:?}", other),
    };
    assert!(!run_id.is_empty());

    let init = r#"{"type":"system","subtype":"init","session_id":"S1"}"#;
    assert!(adapter.adapt(init).unwrap().is_empty());
    assert_eq!(adapter.session_id(), Some("S1"));

    let mut events = feed(
        &mut adapter,
        &[
            MESSAGE_START,
            &block_start(0, r#"{"type":"text","text":""}"#),
            &block_delta(0, r#"{"type":"text_delta","text":"hello"}"#),
            &block_stop(0),
            MESSAGE_STOP,
        ],
    );
    events.extend(adapter.finalize());

    let text: String = events
        .iter()
        .filter_map(|e| match e {
            AguiEvent::TextMessageContent { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(text, "hello");

    match events.last() {
        Some(AguiEvent::RunFinished { run_id: finished, .. }) => assert_eq!(finished, &run_id),
        other => panic!("Expected RunFinished, got {:?}", other),
    }
}

// ============================================================================
// Line handling
// ============================================================================

#[test]
fn test_line_framing() {
    let mut adapter = ClaudeAgentAdapter::new("T1");
    assert!(adapter.adapt("").unwrap().is_empty());
    assert!(adapter.adapt("   ").unwrap().is_empty());
    assert!(adapter.adapt("data: [DONE]").unwrap().is_empty());

    let events = adapter
        .adapt(r#"data: {"type":"error","error":{"message":"overloaded"},"code":"529"}"#)
        .unwrap();
    match &events[0] {
        AguiEvent::RunError { error, code, .. } => {
            assert_eq!(error, "overloaded");
            assert_eq!(code.as_deref(), Some("529"));
        }
        other => panic!("Expected RunError, got {:?}", other),
    }

    assert!(adapter.adapt("not json").is_err());
    assert!(adapter.adapt("{broken").is_err());
}

// ============================================================================
// Lenient upstream parsing
// ============================================================================

#[test]
fn test_numeric_error_code_surfaces_run_error() {
    let mut adapter = ClaudeAgentAdapter::new("T1");

    let events = adapter
        .adapt(r#"{"type":"error","error":"rate limited","code":429}"#)
        .unwrap();
    match &events[..] {
        [AguiEvent::RunError { error, code, .. }] => {
            assert_eq!(error, "rate limited");
            assert_eq!(code.as_deref(), Some("429"));
        }
        other => panic!("Expected one RunError, got {:?}", other),
    }

    let events = adapter
        .adapt(r#"{"type":"error","error":{"message":"boom","code":500}}"#)
        .unwrap();
    match &events[..] {
        [AguiEvent::RunError { error, code, .. }] => {
            assert_eq!(error, "boom");
            assert_eq!(code.as_deref(), Some("500"));
        }
        other => panic!("Expected one RunError, got {:?}", other),
    }
}

#[test]
fn test_malformed_unit_does_not_drop_valid_content() {
    let mut adapter = ClaudeAgentAdapter::new("T1");

    let events = adapter
        .adapt(r#"{"type":"assistant","message":{"id":"m1","content":[{"type":"text","text":"keep"},{"no_type":1},{"type":"text","text":null}]}}"#)
        .unwrap();
    match &events[..] {
        [AguiEvent::TextMessageContent { content, .. }] => assert_eq!(content, "keep"),
        other => panic!("Expected one TextMessageContent, got {:?}", other),
    }

    let events = adapter
        .adapt(r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"ok"},{"type":"tool_result","is_error":"nope"}]}}"#)
        .unwrap();
    assert_eq!(types(&events), vec!["TOOL_CALL_RESULT"]);
}
