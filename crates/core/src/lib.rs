//! AGUI Bridge Core
//!
//! Foundational event types and the adapter trait for the AGUI Bridge
//! workspace. This crate has no dependencies on host-level code (runtime,
//! configuration, transport).
//!
//! ## Module Organization
//!
//! - `streaming` - AGUI event enum, adapter error, and `StreamAdapter` trait

pub mod streaming;

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{generate_id, now_millis, AdapterError, AguiEvent, Role, StreamAdapter};
