//! Data Models
//!
//! Upstream message types, thread session state, and settings.

pub mod sdk_message;
pub mod session;
pub mod settings;

pub use sdk_message::{
    BlockDelta, ContentBlockDescriptor, ContentUnit, MessageBody, MessageContent, SdkMessage,
    StreamSubEvent,
};
pub use session::{SessionState, ThreadInfo};
pub use settings::{BridgeConfig, OutputFormat, SettingsUpdate};
