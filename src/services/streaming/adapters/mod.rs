//! Upstream-Specific Stream Adapters
//!
//! Each adapter handles the unique streaming format of its upstream SDK.

pub mod claude_agent;

pub use claude_agent::{BlockKind, ClaudeAgentAdapter};
