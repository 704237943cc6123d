//! AGUI Stream Event Types
//!
//! Normalized, client-consumable event types and the adapter trait for
//! turning an upstream agent SDK stream into AGUI events. These types are
//! shared by the adapter implementations and by the host-side services
//! (streaming driver, session manager, SSE encoding).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Role carried by `TEXT_MESSAGE_START`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
}

/// Normalized AGUI event.
///
/// Serialized as a JSON object tagged by `type` (`RUN_STARTED`,
/// `TEXT_MESSAGE_CONTENT`, ...) with camelCase fields. Every event carries a
/// `timestamp` in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum AguiEvent {
    // ========================================================================
    // Run lifecycle
    // ========================================================================
    /// A run has started on a thread
    RunStarted {
        thread_id: String,
        run_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
        timestamp: u64,
    },

    /// A run has finished (cleanly or after forced closure)
    RunFinished {
        thread_id: String,
        run_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        timestamp: u64,
    },

    /// The run failed; does not require an active run
    RunError {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        timestamp: u64,
    },

    // ========================================================================
    // Text messages
    // ========================================================================
    TextMessageStart {
        message_id: String,
        role: Role,
        timestamp: u64,
    },

    TextMessageContent {
        message_id: String,
        content: String,
        timestamp: u64,
    },

    TextMessageEnd {
        message_id: String,
        timestamp: u64,
    },

    // ========================================================================
    // Thinking segments
    // ========================================================================
    ThinkingStart {
        message_id: String,
        timestamp: u64,
    },

    ThinkingContent {
        message_id: String,
        content: String,
        timestamp: u64,
    },

    ThinkingEnd {
        message_id: String,
        timestamp: u64,
    },

    // ========================================================================
    // Tool calls
    // ========================================================================
    ToolCallStart {
        tool_call_id: String,
        tool_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
        timestamp: u64,
    },

    /// Raw argument text. Streaming fragments must be concatenated by the
    /// consumer before parsing.
    ToolCallArgs {
        tool_call_id: String,
        args: String,
        timestamp: u64,
    },

    ToolCallEnd {
        tool_call_id: String,
        timestamp: u64,
    },

    ToolCallResult {
        tool_call_id: String,
        result: String,
        is_error: bool,
        timestamp: u64,
    },
}

impl AguiEvent {
    pub fn run_started(thread_id: impl Into<String>, run_id: impl Into<String>, input: Option<Value>) -> Self {
        Self::RunStarted {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            input,
            timestamp: now_millis(),
        }
    }

    pub fn run_finished(thread_id: impl Into<String>, run_id: impl Into<String>, result: Option<Value>) -> Self {
        Self::RunFinished {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            result,
            timestamp: now_millis(),
        }
    }

    pub fn run_error(error: impl Into<String>, code: Option<String>) -> Self {
        Self::RunError {
            error: error.into(),
            code,
            timestamp: now_millis(),
        }
    }

    pub fn text_message_start(message_id: impl Into<String>) -> Self {
        Self::TextMessageStart {
            message_id: message_id.into(),
            role: Role::Assistant,
            timestamp: now_millis(),
        }
    }

    pub fn text_message_content(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::TextMessageContent {
            message_id: message_id.into(),
            content: content.into(),
            timestamp: now_millis(),
        }
    }

    pub fn text_message_end(message_id: impl Into<String>) -> Self {
        Self::TextMessageEnd {
            message_id: message_id.into(),
            timestamp: now_millis(),
        }
    }

    pub fn thinking_start(message_id: impl Into<String>) -> Self {
        Self::ThinkingStart {
            message_id: message_id.into(),
            timestamp: now_millis(),
        }
    }

    pub fn thinking_content(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ThinkingContent {
            message_id: message_id.into(),
            content: content.into(),
            timestamp: now_millis(),
        }
    }

    pub fn thinking_end(message_id: impl Into<String>) -> Self {
        Self::ThinkingEnd {
            message_id: message_id.into(),
            timestamp: now_millis(),
        }
    }

    pub fn tool_call_start(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        parent_message_id: Option<String>,
    ) -> Self {
        Self::ToolCallStart {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            parent_message_id,
            timestamp: now_millis(),
        }
    }

    pub fn tool_call_args(tool_call_id: impl Into<String>, args: impl Into<String>) -> Self {
        Self::ToolCallArgs {
            tool_call_id: tool_call_id.into(),
            args: args.into(),
            timestamp: now_millis(),
        }
    }

    pub fn tool_call_end(tool_call_id: impl Into<String>) -> Self {
        Self::ToolCallEnd {
            tool_call_id: tool_call_id.into(),
            timestamp: now_millis(),
        }
    }

    pub fn tool_call_result(tool_call_id: impl Into<String>, result: impl Into<String>, is_error: bool) -> Self {
        Self::ToolCallResult {
            tool_call_id: tool_call_id.into(),
            result: result.into(),
            is_error,
            timestamp: now_millis(),
        }
    }

    /// Wire name of the event type, e.g. `"TEXT_MESSAGE_START"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "RUN_STARTED",
            Self::RunFinished { .. } => "RUN_FINISHED",
            Self::RunError { .. } => "RUN_ERROR",
            Self::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            Self::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            Self::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            Self::ThinkingStart { .. } => "THINKING_START",
            Self::ThinkingContent { .. } => "THINKING_CONTENT",
            Self::ThinkingEnd { .. } => "THINKING_END",
            Self::ToolCallStart { .. } => "TOOL_CALL_START",
            Self::ToolCallArgs { .. } => "TOOL_CALL_ARGS",
            Self::ToolCallEnd { .. } => "TOOL_CALL_END",
            Self::ToolCallResult { .. } => "TOOL_CALL_RESULT",
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Self::RunStarted { timestamp, .. }
            | Self::RunFinished { timestamp, .. }
            | Self::RunError { timestamp, .. }
            | Self::TextMessageStart { timestamp, .. }
            | Self::TextMessageContent { timestamp, .. }
            | Self::TextMessageEnd { timestamp, .. }
            | Self::ThinkingStart { timestamp, .. }
            | Self::ThinkingContent { timestamp, .. }
            | Self::ThinkingEnd { timestamp, .. }
            | Self::ToolCallStart { timestamp, .. }
            | Self::ToolCallArgs { timestamp, .. }
            | Self::ToolCallEnd { timestamp, .. }
            | Self::ToolCallResult { timestamp, .. } => *timestamp,
        }
    }

    /// Whether this event terminates a run (`RUN_FINISHED` or `RUN_ERROR`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunFinished { .. } | Self::RunError { .. })
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Generate a fresh identifier, optionally namespaced with a prefix
/// (`msg_…`, `toolu_…`).
pub fn generate_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    if prefix.is_empty() {
        id
    } else {
        format!("{}_{}", prefix, id)
    }
}

/// Errors that can occur while reading a raw upstream line.
///
/// Conversion of an already-parsed message never fails; only the text layer
/// in front of it can.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdapterError {
    /// JSON/data parsing error
    #[error("Parse error: {0}")]
    Parse(String),
    /// Input that is not a JSON object at all
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Trait for adapting an upstream agent stream into AGUI events.
///
/// One adapter instance serves one conversation thread. Calls must be
/// serialized by the caller; distinct instances share no state.
pub trait StreamAdapter: Send + Sync {
    /// Returns the upstream name for logging and identification.
    fn provider_name(&self) -> &'static str;

    /// Returns whether the upstream can emit thinking blocks.
    fn supports_thinking(&self) -> bool;

    /// Returns whether the upstream can emit tool calls.
    fn supports_tools(&self) -> bool;

    /// Adapt a raw stream line to AGUI events.
    ///
    /// A single input line may produce zero, one, or multiple events.
    fn adapt(&mut self, input: &str) -> Result<Vec<AguiEvent>, AdapterError>;

    /// Allocate a new run id and build its `RUN_STARTED`.
    fn create_run_started(&mut self, input: Option<Value>) -> AguiEvent;

    /// Build a `RUN_ERROR`. Does not require an active run.
    fn create_run_error(&self, message: &str, code: Option<String>) -> AguiEvent;

    /// Force-close every open span and finish the run.
    fn finalize(&mut self) -> Vec<AguiEvent>;

    /// Conversation thread the adapter is bound to.
    fn thread_id(&self) -> &str;

    /// Upstream session id, once observed.
    fn session_id(&self) -> Option<&str>;

    /// Reset adapter state for a new conversation.
    fn reset(&mut self) {
        // Default implementation does nothing
    }
}
