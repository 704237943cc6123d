//! Claude Agent SDK Adapter
//!
//! Converts the agent SDK's stream-json messages into AGUI events.
//!
//! With partial messages enabled the SDK emits each assistant turn twice:
//! first incrementally as `stream_event` sub-events, then once more as a
//! batch `assistant` message. The streaming path is authoritative; the batch
//! copy that immediately follows a completed streaming turn is dropped.
//!
//! Open spans (the streaming message, thinking blocks, tool calls) are
//! tracked per content-block index so that every span opened here is closed
//! exactly once, either by the upstream stop event or by [`finalize`].
//!
//! [`finalize`]: ClaudeAgentAdapter::finalize

use std::collections::BTreeMap;

use agui_bridge_core::streaming::{generate_id, AdapterError, AguiEvent, StreamAdapter};
use serde_json::Value;
use tracing::{debug, trace};

use crate::models::sdk_message::{
    BlockDelta, ContentBlockDescriptor, ContentUnit, MessageBody, SdkMessage, StreamSubEvent,
};

/// Kind of an open content block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Thinking,
    ToolUse,
}

/// A content block that has been opened but not yet closed.
#[derive(Debug, Clone)]
struct OpenBlock {
    kind: BlockKind,
    /// Message id for text/thinking blocks, tool call id for tool_use blocks
    id: String,
    accumulated: String,
}

#[derive(Debug, Default)]
struct AdapterState {
    thread_id: String,
    current_run_id: Option<String>,
    current_message_id: Option<String>,
    active_blocks: BTreeMap<usize, OpenBlock>,
    session_id: Option<String>,
    /// Set by `message_stop`; suppresses the batch copy of the same turn.
    has_processed_stream_events: bool,
}

/// Adapter for the Claude Agent SDK stream-json format.
///
/// One instance per conversation thread. Not safe for concurrent `convert`
/// calls on the same instance; the caller serializes delivery.
#[derive(Debug)]
pub struct ClaudeAgentAdapter {
    /// Thread id given at construction, restored by `reset`
    initial_thread_id: String,
    state: AdapterState,
}

impl ClaudeAgentAdapter {
    pub fn new(thread_id: impl Into<String>) -> Self {
        let thread_id = thread_id.into();
        Self {
            initial_thread_id: thread_id.clone(),
            state: AdapterState {
                thread_id,
                ..Default::default()
            },
        }
    }

    // ========================================================================
    // Run lifecycle
    // ========================================================================

    /// Allocate a new run id and build `RUN_STARTED` for it.
    ///
    /// A pending batch suppression from the previous run does not carry over;
    /// the adopted session id does.
    pub fn create_run_started(&mut self, input: Option<Value>) -> AguiEvent {
        let run_id = generate_id("");
        self.state.current_run_id = Some(run_id.clone());
        self.state.has_processed_stream_events = false;
        AguiEvent::run_started(self.state.thread_id.clone(), run_id, input)
    }

    /// `RUN_FINISHED` for the last started run; empty run id if none was started.
    pub fn create_run_finished(&self, result: Option<Value>) -> AguiEvent {
        AguiEvent::run_finished(
            self.state.thread_id.clone(),
            self.state.current_run_id.clone().unwrap_or_default(),
            result,
        )
    }

    pub fn create_run_error(&self, message: &str, code: Option<String>) -> AguiEvent {
        AguiEvent::run_error(message, code)
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Convert one upstream message into zero or more AGUI events.
    pub fn convert(&mut self, message: SdkMessage) -> Vec<AguiEvent> {
        trace!(kind = message.kind_name(), "converting sdk message");

        match message {
            SdkMessage::Sidechain { parent_tool_use_id } => {
                debug!(parent_tool_use_id = %parent_tool_use_id, "dropping sidechain message");
                vec![]
            }
            SdkMessage::SystemInit { session_id } => {
                if let Some(id) = session_id.filter(|id| !id.is_empty()) {
                    debug!(session_id = %id, "adopting upstream session id");
                    self.state.session_id = Some(id.clone());
                    self.state.thread_id = id;
                }
                vec![]
            }
            SdkMessage::StreamEvent { event } => match event {
                Some(event) => self.handle_stream_event(event),
                None => vec![],
            },
            SdkMessage::Assistant { message } => {
                if self.state.has_processed_stream_events {
                    self.state.has_processed_stream_events = false;
                    debug!("skipping batch assistant message already emitted by streaming");
                    return vec![];
                }
                self.convert_assistant_message(message)
            }
            SdkMessage::User { message } => self.convert_tool_results(message),
            SdkMessage::Error { error, code } => {
                let text = error.filter(|e| !e.is_empty());
                vec![self.create_run_error(text.as_deref().unwrap_or("Unknown error"), code)]
            }
            SdkMessage::Result { result } => vec![self.create_run_finished(result)],
            SdkMessage::Other => vec![],
        }
    }

    fn handle_stream_event(&mut self, event: StreamSubEvent) -> Vec<AguiEvent> {
        match event {
            StreamSubEvent::MessageStart { message } => {
                // A new message while one is still open closes the stale one
                let mut events = self.close_open_spans();

                let message_id = message
                    .and_then(|m| m.id)
                    .filter(|id| !id.is_empty())
                    .unwrap_or_else(|| generate_id("msg"));
                self.state.current_message_id = Some(message_id.clone());
                events.push(AguiEvent::text_message_start(message_id));
                events
            }

            StreamSubEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                let index = index.unwrap_or(0);
                let Some(descriptor) = content_block else {
                    return vec![];
                };

                // Re-opening an index closes whatever was left there
                let mut events = vec![];
                if let Some(stale) = self.state.active_blocks.remove(&index) {
                    events.extend(Self::close_block(stale));
                }

                let message_id = self.state.current_message_id.clone().unwrap_or_default();
                match descriptor {
                    ContentBlockDescriptor::Text { text } => {
                        self.state.active_blocks.insert(
                            index,
                            OpenBlock {
                                kind: BlockKind::Text,
                                id: message_id,
                                accumulated: text,
                            },
                        );
                    }
                    ContentBlockDescriptor::Thinking { thinking } => {
                        self.state.active_blocks.insert(
                            index,
                            OpenBlock {
                                kind: BlockKind::Thinking,
                                id: message_id.clone(),
                                accumulated: thinking,
                            },
                        );
                        events.push(AguiEvent::thinking_start(message_id));
                    }
                    ContentBlockDescriptor::ToolUse { id, name } => {
                        let tool_call_id = id
                            .filter(|id| !id.is_empty())
                            .unwrap_or_else(|| generate_id("toolu"));
                        let tool_name = name.unwrap_or_else(|| "unknown".to_string());
                        self.state.active_blocks.insert(
                            index,
                            OpenBlock {
                                kind: BlockKind::ToolUse,
                                id: tool_call_id.clone(),
                                accumulated: String::new(),
                            },
                        );
                        events.push(AguiEvent::tool_call_start(
                            tool_call_id,
                            tool_name,
                            self.state.current_message_id.clone(),
                        ));
                    }
                    ContentBlockDescriptor::Other => {
                        debug!(index, "ignoring unsupported content block kind");
                    }
                }
                events
            }

            StreamSubEvent::ContentBlockDelta { index, delta } => {
                let index = index.unwrap_or(0);
                let message_id = self.state.current_message_id.clone().unwrap_or_default();
                let block = self.state.active_blocks.get_mut(&index);

                match delta {
                    Some(BlockDelta::TextDelta { text }) if !text.is_empty() => {
                        if let Some(block) = block {
                            block.accumulated.push_str(&text);
                        }
                        vec![AguiEvent::text_message_content(message_id, text)]
                    }
                    Some(BlockDelta::ThinkingDelta { thinking }) => {
                        if let Some(block) = block {
                            block.accumulated.push_str(&thinking);
                        }
                        vec![AguiEvent::thinking_content(message_id, thinking)]
                    }
                    Some(BlockDelta::InputJsonDelta { partial_json }) if !partial_json.is_empty() => {
                        // Args need the tool call id, which only a tracked block knows
                        match block {
                            Some(block) => {
                                block.accumulated.push_str(&partial_json);
                                vec![AguiEvent::tool_call_args(block.id.clone(), partial_json)]
                            }
                            None => {
                                debug!(index, "dropping input_json_delta for untracked block");
                                vec![]
                            }
                        }
                    }
                    _ => vec![],
                }
            }

            StreamSubEvent::ContentBlockStop { index } => {
                let index = index.unwrap_or(0);
                match self.state.active_blocks.remove(&index) {
                    Some(block) => Self::close_block(block).into_iter().collect(),
                    None => vec![],
                }
            }

            StreamSubEvent::MessageStop => {
                let mut events: Vec<AguiEvent> = std::mem::take(&mut self.state.active_blocks)
                    .into_values()
                    .filter_map(Self::close_block)
                    .collect();
                let message_id = self.state.current_message_id.take().unwrap_or_default();
                events.push(AguiEvent::text_message_end(message_id));
                self.state.has_processed_stream_events = true;
                events
            }

            StreamSubEvent::Unknown => vec![],
        }
    }

    fn convert_assistant_message(&mut self, message: MessageBody) -> Vec<AguiEvent> {
        let message_id = message
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| generate_id("msg"));
        let mut events = vec![];

        for unit in message.content.into_units() {
            match unit {
                ContentUnit::Text { text } if !text.is_empty() => {
                    events.push(AguiEvent::text_message_content(message_id.clone(), text));
                }
                // Batch form has no start/stop signals; synthesize the triple
                ContentUnit::Thinking { thinking } if !thinking.is_empty() => {
                    events.push(AguiEvent::thinking_start(message_id.clone()));
                    events.push(AguiEvent::thinking_content(message_id.clone(), thinking));
                    events.push(AguiEvent::thinking_end(message_id.clone()));
                }
                ContentUnit::ToolUse { id, name, input } => {
                    let tool_call_id = id
                        .filter(|id| !id.is_empty())
                        .unwrap_or_else(|| generate_id("toolu"));
                    let tool_name = name.unwrap_or_else(|| "unknown".to_string());
                    let args = input
                        .unwrap_or_else(|| Value::Object(Default::default()))
                        .to_string();

                    events.push(AguiEvent::tool_call_start(
                        tool_call_id.clone(),
                        tool_name,
                        Some(message_id.clone()),
                    ));
                    events.push(AguiEvent::tool_call_args(tool_call_id.clone(), args));
                    events.push(AguiEvent::tool_call_end(tool_call_id));
                }
                _ => {}
            }
        }

        events
    }

    fn convert_tool_results(&mut self, message: MessageBody) -> Vec<AguiEvent> {
        message
            .content
            .into_units()
            .into_iter()
            .filter_map(|unit| match unit {
                ContentUnit::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    let tool_call_id = tool_use_id
                        .filter(|id| !id.is_empty())
                        .unwrap_or_else(|| generate_id("toolu"));
                    Some(AguiEvent::tool_call_result(
                        tool_call_id,
                        tool_result_text(content),
                        is_error.unwrap_or(false),
                    ))
                }
                _ => None,
            })
            .collect()
    }

    // ========================================================================
    // Span closing
    // ========================================================================

    fn close_block(block: OpenBlock) -> Option<AguiEvent> {
        match block.kind {
            BlockKind::Thinking => Some(AguiEvent::thinking_end(block.id)),
            BlockKind::ToolUse => Some(AguiEvent::tool_call_end(block.id)),
            BlockKind::Text => None,
        }
    }

    /// Close every open block (in index order), then the open message.
    fn close_open_spans(&mut self) -> Vec<AguiEvent> {
        let mut events: Vec<AguiEvent> = std::mem::take(&mut self.state.active_blocks)
            .into_values()
            .filter_map(Self::close_block)
            .collect();
        if let Some(message_id) = self.state.current_message_id.take() {
            events.push(AguiEvent::text_message_end(message_id));
        }
        events
    }

    /// Force-close anything left open and finish the run.
    ///
    /// Must be called once when the upstream stream ends for any reason.
    /// `RUN_FINISHED` is always the last event.
    pub fn finalize(&mut self) -> Vec<AguiEvent> {
        let mut events = self.close_open_spans();
        if !events.is_empty() {
            debug!(closed = events.len(), "force-closed open spans at finalize");
        }
        events.push(self.create_run_finished(None));
        events
    }

    /// Reinitialize all state for reuse across conversations.
    pub fn reset(&mut self) {
        self.state = AdapterState {
            thread_id: self.initial_thread_id.clone(),
            ..Default::default()
        };
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn thread_id(&self) -> &str {
        &self.state.thread_id
    }

    /// Override the thread id; the session id follows it for the rest of the run.
    pub fn set_thread_id(&mut self, thread_id: impl Into<String>) {
        let thread_id = thread_id.into();
        self.state.session_id = Some(thread_id.clone());
        self.state.thread_id = thread_id;
    }

    pub fn session_id(&self) -> Option<&str> {
        self.state.session_id.as_deref()
    }

    pub fn current_run_id(&self) -> Option<&str> {
        self.state.current_run_id.as_deref()
    }

    pub fn current_message_id(&self) -> Option<&str> {
        self.state.current_message_id.as_deref()
    }

    pub fn open_block_count(&self) -> usize {
        self.state.active_blocks.len()
    }

    pub fn open_block_kind(&self, index: usize) -> Option<BlockKind> {
        self.state.active_blocks.get(&index).map(|block| block.kind)
    }

    /// Text accumulated so far for the open block at `index`.
    pub fn accumulated(&self, index: usize) -> Option<&str> {
        self.state
            .active_blocks
            .get(&index)
            .map(|block| block.accumulated.as_str())
    }

    /// Whether a message or block is still waiting to be closed.
    pub fn has_open_spans(&self) -> bool {
        self.state.current_message_id.is_some() || !self.state.active_blocks.is_empty()
    }
}

impl Default for ClaudeAgentAdapter {
    fn default() -> Self {
        Self::new(generate_id(""))
    }
}

/// Tool result content as text: strings verbatim, anything else as JSON.
fn tool_result_text(content: Option<Value>) -> String {
    match content {
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

impl StreamAdapter for ClaudeAgentAdapter {
    fn provider_name(&self) -> &'static str {
        "claude-agent"
    }

    fn supports_thinking(&self) -> bool {
        true
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<AguiEvent>, AdapterError> {
        let trimmed = input.trim();

        // Tolerate lines relayed through an SSE hop
        let json_str = trimmed.strip_prefix("data:").map(str::trim).unwrap_or(trimmed);

        if json_str.is_empty() || json_str == "[DONE]" {
            return Ok(vec![]);
        }
        if !json_str.starts_with('{') {
            return Err(AdapterError::InvalidFormat(format!(
                "expected a JSON object, got: {}",
                json_str.chars().take(40).collect::<String>()
            )));
        }

        let message: SdkMessage =
            serde_json::from_str(json_str).map_err(|e| AdapterError::Parse(e.to_string()))?;

        Ok(self.convert(message))
    }

    fn create_run_started(&mut self, input: Option<Value>) -> AguiEvent {
        ClaudeAgentAdapter::create_run_started(self, input)
    }

    fn create_run_error(&self, message: &str, code: Option<String>) -> AguiEvent {
        ClaudeAgentAdapter::create_run_error(self, message, code)
    }

    fn finalize(&mut self) -> Vec<AguiEvent> {
        ClaudeAgentAdapter::finalize(self)
    }

    fn thread_id(&self) -> &str {
        ClaudeAgentAdapter::thread_id(self)
    }

    fn session_id(&self) -> Option<&str> {
        ClaudeAgentAdapter::session_id(self)
    }

    fn reset(&mut self) {
        ClaudeAgentAdapter::reset(self)
    }
}
