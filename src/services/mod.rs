//! Services
//!
//! Stream conversion and thread session management.

pub mod session_manager;
pub mod streaming;

pub use session_manager::ThreadSessionManager;
