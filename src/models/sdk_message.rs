//! Agent SDK Message Models
//!
//! Typed view of the agent SDK's newline-delimited stream-json output.
//!
//! The SDK emits, per run:
//!   system(init) → stream_event* → assistant → user(tool_result)* → ... → result
//!
//! `stream_event` lines wrap the raw API sub-events (`message_start`,
//! `content_block_delta`, ...) and carry the same content as the following
//! batch `assistant` line. Messages belonging to a sub-agent are marked as
//! sidechain traffic and parented to the tool call that spawned them.

use serde::Deserialize;
use serde_json::Value;

/// One upstream SDK message, classified into a closed set of kinds.
///
/// Deserialized from the wire shape; sidechain classification takes
/// precedence over the `type` tag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireMessage")]
pub enum SdkMessage {
    /// Session initialization (`system` with subtype `init`)
    SystemInit { session_id: Option<String> },
    /// Streaming wrapper around one API sub-event
    StreamEvent { event: Option<StreamSubEvent> },
    /// Complete (batch) assistant message
    Assistant { message: MessageBody },
    /// User message; carries tool results back to the model
    User { message: MessageBody },
    /// Upstream failure
    Error {
        error: Option<String>,
        code: Option<String>,
    },
    /// End-of-run summary
    Result { result: Option<Value> },
    /// Sub-agent traffic parented to a tool call
    Sidechain { parent_tool_use_id: String },
    /// Anything else (other system subtypes, future message kinds)
    Other,
}

impl SdkMessage {
    /// Short kind name for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::SystemInit { .. } => "system_init",
            Self::StreamEvent { .. } => "stream_event",
            Self::Assistant { .. } => "assistant",
            Self::User { .. } => "user",
            Self::Error { .. } => "error",
            Self::Result { .. } => "result",
            Self::Sidechain { .. } => "sidechain",
            Self::Other => "other",
        }
    }
}

/// Message payload shared by `assistant`, `user`, and `message_start`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: MessageContent,
}

/// Content can be either a list of content units or a plain string.
///
/// Units are decoded one at a time; a malformed unit becomes
/// [`ContentUnit::Other`] without discarding its siblings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawContent")]
pub enum MessageContent {
    /// Array of content units (standard format)
    Units(Vec<ContentUnit>),
    /// Plain string (simplified format)
    Text(String),
    #[default]
    Empty,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Units(Vec<Value>),
    Text(String),
    Other(Value),
}

impl From<RawContent> for MessageContent {
    fn from(raw: RawContent) -> Self {
        match raw {
            RawContent::Units(units) => MessageContent::Units(
                units
                    .into_iter()
                    .map(|unit| serde_json::from_value(unit).unwrap_or(ContentUnit::Other))
                    .collect(),
            ),
            RawContent::Text(text) => MessageContent::Text(text),
            RawContent::Other(_) => MessageContent::Empty,
        }
    }
}

impl MessageContent {
    /// Content as a unit list; plain text becomes a single text unit.
    pub fn into_units(self) -> Vec<ContentUnit> {
        match self {
            MessageContent::Units(units) => units,
            MessageContent::Text(text) => vec![ContentUnit::Text { text }],
            MessageContent::Empty => vec![],
        }
    }
}

/// A content unit in a batch message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentUnit {
    Text {
        #[serde(default, deserialize_with = "null_as_empty")]
        text: String,
    },
    Thinking {
        #[serde(default, deserialize_with = "null_as_empty")]
        thinking: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Option<Value>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        /// String or structured content
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Other,
}

/// Inner event inside a `stream_event` wrapper
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamSubEvent {
    MessageStart {
        #[serde(default)]
        message: Option<MessageBody>,
    },
    ContentBlockStart {
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        content_block: Option<ContentBlockDescriptor>,
    },
    ContentBlockDelta {
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        delta: Option<BlockDelta>,
    },
    ContentBlockStop {
        #[serde(default)]
        index: Option<usize>,
    },
    MessageStop,
    #[serde(other)]
    Unknown,
}

/// Descriptor of a content block opened by `content_block_start`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockDescriptor {
    Text {
        #[serde(default, deserialize_with = "null_as_empty")]
        text: String,
    },
    Thinking {
        #[serde(default, deserialize_with = "null_as_empty")]
        thinking: String,
    },
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Delta inside `content_block_delta`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta {
        #[serde(default, deserialize_with = "null_as_empty")]
        text: String,
    },
    ThinkingDelta {
        #[serde(default, deserialize_with = "null_as_empty")]
        thinking: String,
    },
    InputJsonDelta {
        #[serde(default, deserialize_with = "null_as_empty")]
        partial_json: String,
    },
    #[serde(other)]
    Other,
}

// ============================================================================
// Wire format
// ============================================================================

/// Sub-agent lineage fields present on any message kind.
#[derive(Debug, Default, Deserialize)]
struct Lineage {
    #[serde(default, alias = "isSidechain")]
    is_sidechain: bool,
    #[serde(default, alias = "parentToolUseId")]
    parent_tool_use_id: Option<String>,
}

impl Lineage {
    fn sidechain_parent(self) -> Option<String> {
        if self.is_sidechain {
            self.parent_tool_use_id
        } else {
            None
        }
    }
}

/// `error` may be a bare string or an object with message and type/code.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Detail {
        #[serde(default)]
        message: Option<String>,
        #[serde(default, rename = "type")]
        error_type: Option<String>,
        #[serde(default)]
        code: Option<Value>,
    },
    Other(Value),
}

/// Codes arrive as strings or as numbers (HTTP status).
fn code_text(code: Option<Value>) -> Option<String> {
    match code? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// `null` reads as an empty string, which the adapter treats as absent.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireMessage {
    System {
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
        #[serde(flatten)]
        lineage: Lineage,
    },
    StreamEvent {
        #[serde(default)]
        event: Option<StreamSubEvent>,
        #[serde(flatten)]
        lineage: Lineage,
    },
    Assistant {
        #[serde(default)]
        message: Option<MessageBody>,
        #[serde(flatten)]
        lineage: Lineage,
    },
    User {
        #[serde(default)]
        message: Option<MessageBody>,
        #[serde(flatten)]
        lineage: Lineage,
    },
    Error {
        #[serde(default)]
        error: Option<ErrorField>,
        #[serde(default)]
        code: Option<Value>,
        #[serde(flatten)]
        lineage: Lineage,
    },
    Result {
        #[serde(default)]
        result: Option<Value>,
        #[serde(flatten)]
        lineage: Lineage,
    },
    #[serde(other)]
    Unknown,
}

impl From<WireMessage> for SdkMessage {
    fn from(wire: WireMessage) -> Self {
        let (lineage, message) = match wire {
            WireMessage::System {
                subtype,
                session_id,
                lineage,
            } => {
                let message = match subtype.as_deref() {
                    None | Some("init") => SdkMessage::SystemInit { session_id },
                    Some(_) => SdkMessage::Other,
                };
                (lineage, message)
            }
            WireMessage::StreamEvent { event, lineage } => {
                (lineage, SdkMessage::StreamEvent { event })
            }
            WireMessage::Assistant { message, lineage } => (
                lineage,
                SdkMessage::Assistant {
                    message: message.unwrap_or_default(),
                },
            ),
            WireMessage::User { message, lineage } => (
                lineage,
                SdkMessage::User {
                    message: message.unwrap_or_default(),
                },
            ),
            WireMessage::Error {
                error,
                code,
                lineage,
            } => {
                let code = code_text(code);
                let (error, code) = match error {
                    Some(ErrorField::Text(text)) => (Some(text), code),
                    Some(ErrorField::Detail {
                        message,
                        error_type,
                        code: detail_code,
                    }) => (message, code.or(code_text(detail_code)).or(error_type)),
                    Some(ErrorField::Other(Value::Null)) | None => (None, code),
                    Some(ErrorField::Other(other)) => (Some(other.to_string()), code),
                };
                (lineage, SdkMessage::Error { error, code })
            }
            WireMessage::Result { result, lineage } => (lineage, SdkMessage::Result { result }),
            WireMessage::Unknown => return SdkMessage::Other,
        };

        match lineage.sidechain_parent() {
            Some(parent_tool_use_id) => SdkMessage::Sidechain { parent_tool_use_id },
            None => message,
        }
    }
}
