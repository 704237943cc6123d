//! Settings Models
//!
//! Bridge configuration and settings data structures.

use serde::{Deserialize, Serialize};

/// Downstream frame format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Server-Sent Events frames (`data: {...}\n\n`)
    #[default]
    Sse,
    /// One JSON object per line
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sse" => Ok(Self::Sse),
            "jsonl" | "ndjson" => Ok(Self::Jsonl),
            other => Err(format!("Invalid output format: {}. Must be 'sse' or 'jsonl'", other)),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_CAPACITY: usize = 65_536;

/// Bridge configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Default log level; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Frame format written downstream
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Emit `event: <TYPE>` lines in SSE frames
    #[serde(default)]
    pub sse_named_events: bool,
    /// Capacity of the per-run event channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Capacity of each thread's broadcast buffer
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// Skip malformed upstream lines instead of aborting the run
    #[serde(default = "default_true")]
    pub skip_malformed_lines: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_channel_capacity() -> usize {
    256
}

fn default_broadcast_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_format: OutputFormat::Sse,
            sse_named_events: false,
            channel_capacity: default_channel_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
            skip_malformed_lines: true,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub log_level: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub sse_named_events: Option<bool>,
    pub channel_capacity: Option<usize>,
    pub broadcast_capacity: Option<usize>,
    pub skip_malformed_lines: Option<bool>,
}

impl BridgeConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(level) = update.log_level {
            self.log_level = level;
        }
        if let Some(format) = update.output_format {
            self.output_format = format;
        }
        if let Some(named) = update.sse_named_events {
            self.sse_named_events = named;
        }
        if let Some(capacity) = update.channel_capacity {
            self.channel_capacity = capacity;
        }
        if let Some(capacity) = update.broadcast_capacity {
            self.broadcast_capacity = capacity;
        }
        if let Some(skip) = update.skip_malformed_lines {
            self.skip_malformed_lines = skip;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CAPACITY {
            return Err(format!("channel_capacity must be between 1 and {}", MAX_CAPACITY));
        }

        if self.broadcast_capacity == 0 || self.broadcast_capacity > MAX_CAPACITY {
            return Err(format!("broadcast_capacity must be between 1 and {}", MAX_CAPACITY));
        }

        Ok(())
    }
}
