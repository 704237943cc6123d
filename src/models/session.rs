//! Thread Session Models
//!
//! State of a conversation thread as tracked by the session manager.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a thread's current run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No run has been started
    #[default]
    Idle,
    /// A run is in progress
    Running,
    /// The last run was finalized
    Finished,
    /// The last run was aborted
    Error,
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }
}

/// Snapshot of a thread for listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadInfo {
    /// Key the thread is registered under
    pub thread_id: String,
    /// Upstream session id, once adopted
    pub session_id: Option<String>,
    pub state: SessionState,
    /// Run id of the current or last run
    pub run_id: Option<String>,
    pub run_count: u32,
    pub event_count: u64,
    /// Active downstream subscribers
    pub subscribers: usize,
    /// RFC 3339 creation timestamp
    pub created_at: String,
}
