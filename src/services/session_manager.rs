//! Thread Session Manager
//!
//! Keeps one adapter per conversation thread and fans its events out to
//! downstream subscribers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use agui_bridge_core::streaming::{generate_id, AguiEvent, StreamAdapter};

use crate::models::session::{SessionState, ThreadInfo};
use crate::models::settings::BridgeConfig;
use crate::services::streaming::ClaudeAgentAdapter;
use crate::utils::error::{AppError, AppResult};

/// A single conversation thread
struct ThreadSession {
    adapter: ClaudeAgentAdapter,
    state: SessionState,
    run_count: u32,
    event_count: u64,
    sender: broadcast::Sender<AguiEvent>,
    created_at: String,
}

impl ThreadSession {
    fn new(thread_id: &str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            adapter: ClaudeAgentAdapter::new(thread_id),
            state: SessionState::Idle,
            run_count: 0,
            event_count: 0,
            sender,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn info(&self, thread_id: &str) -> ThreadInfo {
        ThreadInfo {
            thread_id: thread_id.to_string(),
            session_id: self.adapter.session_id().map(str::to_string),
            state: self.state,
            run_id: self.adapter.current_run_id().map(str::to_string),
            run_count: self.run_count,
            event_count: self.event_count,
            subscribers: self.sender.receiver_count(),
            created_at: self.created_at.clone(),
        }
    }

    /// Broadcast events; a thread with no subscribers just drops them
    fn publish(&mut self, events: &[AguiEvent]) {
        self.event_count += events.len() as u64;
        for event in events {
            let _ = self.sender.send(event.clone());
        }
    }

    fn finalize(&mut self) -> Vec<AguiEvent> {
        let events = self.adapter.finalize();
        self.publish(&events);
        self.state = SessionState::Finished;
        events
    }
}

/// Manages conversation threads and their runs
pub struct ThreadSessionManager {
    threads: Arc<RwLock<HashMap<String, ThreadSession>>>,
    broadcast_capacity: usize,
}

impl ThreadSessionManager {
    /// Create a new session manager with default settings
    pub fn new() -> Self {
        Self::from_config(&BridgeConfig::default())
    }

    /// Create a manager sized by the bridge config
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::with_capacity(config.broadcast_capacity)
    }

    /// Create a manager whose per-thread broadcast buffers hold `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
            broadcast_capacity: capacity.max(1),
        }
    }

    /// Open a thread, generating an id when none is given.
    ///
    /// Reopening an existing thread returns its current info.
    pub async fn open_thread(&self, thread_id: Option<&str>) -> ThreadInfo {
        let thread_id = thread_id
            .map(str::to_string)
            .unwrap_or_else(|| generate_id("thread"));

        let mut threads = self.threads.write().await;
        let session = threads.entry(thread_id.clone()).or_insert_with(|| {
            debug!(thread_id = %thread_id, "opened thread");
            ThreadSession::new(&thread_id, self.broadcast_capacity)
        });
        session.info(&thread_id)
    }

    /// Subscribe to a thread's event stream
    pub async fn subscribe(&self, thread_id: &str) -> AppResult<broadcast::Receiver<AguiEvent>> {
        let threads = self.threads.read().await;
        let session = threads.get(thread_id).ok_or_else(|| not_found(thread_id))?;
        Ok(session.sender.subscribe())
    }

    /// Start a run on a thread and return its `RUN_STARTED`
    pub async fn start_run(&self, thread_id: &str, input: Option<Value>) -> AppResult<AguiEvent> {
        let mut threads = self.threads.write().await;
        let session = threads.get_mut(thread_id).ok_or_else(|| not_found(thread_id))?;

        if session.state.is_running() {
            return Err(AppError::validation(format!(
                "Thread already has a running run: {}",
                thread_id
            )));
        }

        let event = session.adapter.create_run_started(input);
        session.state = SessionState::Running;
        session.run_count += 1;
        session.publish(std::slice::from_ref(&event));
        info!(thread_id = %thread_id, run = session.run_count, "run started");
        Ok(event)
    }

    /// Feed one upstream line into a thread's running run
    pub async fn ingest_line(&self, thread_id: &str, line: &str) -> AppResult<Vec<AguiEvent>> {
        let mut threads = self.threads.write().await;
        let session = threads.get_mut(thread_id).ok_or_else(|| not_found(thread_id))?;

        if !session.state.is_running() {
            return Err(AppError::validation(format!(
                "Thread has no running run: {}",
                thread_id
            )));
        }

        let events = session.adapter.adapt(line).map_err(|e| {
            warn!(thread_id = %thread_id, error = %e, "malformed upstream line");
            AppError::from(e)
        })?;
        session.publish(&events);
        Ok(events)
    }

    /// Finalize a thread's run. A thread that is not running yields no events.
    pub async fn finish_run(&self, thread_id: &str) -> AppResult<Vec<AguiEvent>> {
        let mut threads = self.threads.write().await;
        let session = threads.get_mut(thread_id).ok_or_else(|| not_found(thread_id))?;

        if !session.state.is_running() {
            return Ok(vec![]);
        }

        let events = session.finalize();
        info!(thread_id = %thread_id, events = session.event_count, "run finished");
        Ok(events)
    }

    /// Abort a thread's run: `RUN_ERROR` followed by the finalize events
    pub async fn abort_run(&self, thread_id: &str, reason: &str) -> AppResult<Vec<AguiEvent>> {
        let mut threads = self.threads.write().await;
        let session = threads.get_mut(thread_id).ok_or_else(|| not_found(thread_id))?;

        if !session.state.is_running() {
            return Ok(vec![]);
        }

        let error = session.adapter.create_run_error(reason, None);
        session.publish(std::slice::from_ref(&error));

        let mut events = vec![error];
        events.extend(session.finalize());
        session.state = SessionState::Error;
        warn!(thread_id = %thread_id, reason = %reason, "run aborted");
        Ok(events)
    }

    /// Get a thread's info
    pub async fn get_thread(&self, thread_id: &str) -> AppResult<ThreadInfo> {
        let threads = self.threads.read().await;
        threads
            .get(thread_id)
            .map(|session| session.info(thread_id))
            .ok_or_else(|| not_found(thread_id))
    }

    /// List all threads, oldest first
    pub async fn list_threads(&self) -> Vec<ThreadInfo> {
        let threads = self.threads.read().await;
        let mut infos: Vec<ThreadInfo> = threads
            .iter()
            .map(|(id, session)| session.info(id))
            .collect();
        infos.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        infos
    }

    /// Remove a thread, finalizing a running run first
    pub async fn remove_thread(&self, thread_id: &str) -> AppResult<Vec<AguiEvent>> {
        let mut threads = self.threads.write().await;
        let mut session = threads.remove(thread_id).ok_or_else(|| not_found(thread_id))?;

        let events = if session.state.is_running() {
            session.finalize()
        } else {
            vec![]
        };
        debug!(thread_id = %thread_id, "removed thread");
        Ok(events)
    }

    /// Events each thread buffers for slow subscribers
    pub fn broadcast_capacity(&self) -> usize {
        self.broadcast_capacity
    }

    /// Number of open threads
    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

impl Default for ThreadSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(thread_id: &str) -> AppError {
    AppError::not_found(format!("Thread not found: {}", thread_id))
}
