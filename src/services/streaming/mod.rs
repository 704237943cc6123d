//! AGUI Streaming Layer
//!
//! Converts an upstream agent SDK stream into AGUI events and encodes them
//! for downstream delivery:
//! - Claude Agent SDK (stream-json, with partial messages)

pub mod adapters;
pub mod service;
pub mod sse;

// Re-export main types
pub use adapters::ClaudeAgentAdapter;
pub use agui_bridge_core::streaming::{AdapterError, AguiEvent, StreamAdapter};
pub use service::{AguiStreamingService, StreamError};
pub use sse::FrameEncoder;
