//! AGUI Streaming Service
//!
//! Drives one adapter through a run: issues `RUN_STARTED`, feeds upstream
//! lines in arrival order, and finalizes exactly once when the upstream
//! stream ends for any reason.

use agui_bridge_core::streaming::{AdapterError, AguiEvent, StreamAdapter};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Errors that can occur during stream processing
#[derive(Error, Debug, Clone)]
pub enum StreamError {
    /// Error from the adapter while reading a line
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
    /// Error sending events through the channel
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Per-run streaming driver around a single adapter.
pub struct AguiStreamingService {
    /// The adapter for this thread
    adapter: Box<dyn StreamAdapter>,
    /// Optional event sender for async event emission
    event_tx: Option<mpsc::Sender<AguiEvent>>,
    /// Whether `finish`/`abort` already ran for the current run
    finished: bool,
    lines_processed: u64,
    events_emitted: u64,
}

impl AguiStreamingService {
    /// Create a new streaming service.
    ///
    /// # Arguments
    /// * `adapter` - Adapter bound to the conversation thread
    /// * `event_tx` - Optional channel sender for event emission
    pub fn new(adapter: Box<dyn StreamAdapter>, event_tx: Option<mpsc::Sender<AguiEvent>>) -> Self {
        Self {
            adapter,
            event_tx,
            finished: false,
            lines_processed: 0,
            events_emitted: 0,
        }
    }

    /// Start a run and emit its `RUN_STARTED`.
    pub async fn start_run(&mut self, input: Option<Value>) -> Result<AguiEvent, StreamError> {
        let event = self.adapter.create_run_started(input);
        self.finished = false;
        info!(
            provider = self.adapter.provider_name(),
            thread_id = self.adapter.thread_id(),
            "run started"
        );
        self.emit(std::slice::from_ref(&event)).await?;
        Ok(event)
    }

    /// Process a raw stream line and return AGUI events.
    ///
    /// If an event channel is configured, events are also sent through it.
    pub async fn process_line(&mut self, line: &str) -> Result<Vec<AguiEvent>, StreamError> {
        let events = self.process_line_sync(line)?;
        self.emit(&events).await?;
        Ok(events)
    }

    /// Process a line synchronously (without sending through channel).
    pub fn process_line_sync(&mut self, line: &str) -> Result<Vec<AguiEvent>, StreamError> {
        self.lines_processed += 1;
        let events = self.adapter.adapt(line)?;
        self.events_emitted += events.len() as u64;
        Ok(events)
    }

    /// Finalize the run. Subsequent calls return no events until the next
    /// `start_run`.
    pub async fn finish(&mut self) -> Result<Vec<AguiEvent>, StreamError> {
        if self.finished {
            debug!("finish called on an already finished run");
            return Ok(vec![]);
        }
        self.finished = true;

        let events = self.adapter.finalize();
        self.events_emitted += events.len() as u64;
        info!(
            thread_id = self.adapter.thread_id(),
            lines = self.lines_processed,
            events = self.events_emitted,
            "run finished"
        );
        self.emit(&events).await?;
        Ok(events)
    }

    /// Abort the run: `RUN_ERROR` followed by the finalize events.
    pub async fn abort(&mut self, reason: &str) -> Result<Vec<AguiEvent>, StreamError> {
        if self.finished {
            return Ok(vec![]);
        }

        let error = self.adapter.create_run_error(reason, None);
        self.events_emitted += 1;
        self.emit(std::slice::from_ref(&error)).await?;

        let mut events = vec![error];
        events.extend(self.finish().await?);
        Ok(events)
    }

    async fn emit(&self, events: &[AguiEvent]) -> Result<(), StreamError> {
        if let Some(tx) = &self.event_tx {
            for event in events {
                tx.send(event.clone())
                    .await
                    .map_err(|e| StreamError::Channel(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Whether the current run has been finalized.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn thread_id(&self) -> &str {
        self.adapter.thread_id()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.adapter.session_id()
    }

    pub fn lines_processed(&self) -> u64 {
        self.lines_processed
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted
    }

    /// Reset the adapter state for a new conversation.
    pub fn reset(&mut self) {
        self.adapter.reset();
        self.finished = false;
        self.lines_processed = 0;
        self.events_emitted = 0;
    }
}

impl std::fmt::Debug for AguiStreamingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AguiStreamingService")
            .field("provider", &self.adapter.provider_name())
            .field("thread_id", &self.adapter.thread_id())
            .field("finished", &self.finished)
            .finish()
    }
}
