//! AGUI Bridge
//!
//! Converts an agent SDK's stream-json output into AGUI protocol events.
//! It includes:
//! - The upstream message model and the stateful stream adapter
//! - A per-run streaming service and SSE/JSONL frame encoding
//! - A thread session manager with broadcast fan-out
//! - Config, logging and error utilities

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use agui_bridge_core::{AdapterError, AguiEvent, Role, StreamAdapter};
pub use models::settings::{BridgeConfig, OutputFormat, SettingsUpdate};
pub use services::session_manager::ThreadSessionManager;
pub use services::streaming::{AguiStreamingService, ClaudeAgentAdapter, FrameEncoder, StreamError};
pub use storage::config::ConfigService;
pub use utils::error::{AppError, AppResult};
