//! Event Frame Encoding
//!
//! Serializes AGUI events for downstream transport, either as Server-Sent
//! Events frames or as newline-delimited JSON.

use agui_bridge_core::streaming::AguiEvent;

use crate::models::settings::OutputFormat;

/// Encodes events into transport frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameEncoder {
    format: OutputFormat,
    /// Prefix SSE frames with `event: <TYPE>`
    named_events: bool,
}

impl FrameEncoder {
    pub fn new(format: OutputFormat, named_events: bool) -> Self {
        Self {
            format,
            named_events,
        }
    }

    pub fn sse(named_events: bool) -> Self {
        Self::new(OutputFormat::Sse, named_events)
    }

    pub fn jsonl() -> Self {
        Self::new(OutputFormat::Jsonl, false)
    }

    /// Encode one event into a complete frame, including its terminator.
    pub fn encode(&self, event: &AguiEvent) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(event)?;
        let frame = match self.format {
            OutputFormat::Sse if self.named_events => {
                format!("event: {}\ndata: {}\n\n", event.event_type(), json)
            }
            OutputFormat::Sse => format!("data: {}\n\n", json),
            OutputFormat::Jsonl => format!("{}\n", json),
        };
        Ok(frame)
    }

    /// Encode a batch of events into one contiguous chunk.
    pub fn encode_all(&self, events: &[AguiEvent]) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for event in events {
            out.push_str(&self.encode(event)?);
        }
        Ok(out)
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::sse(false)
    }
}
