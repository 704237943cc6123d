// AGUI Bridge - command line entry point
//
// Reads stream-json lines from a file or stdin and writes AGUI events to
// stdout as SSE frames or JSON lines.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use agui_bridge::models::settings::{BridgeConfig, OutputFormat};
use agui_bridge::services::streaming::{
    AguiEvent, AguiStreamingService, ClaudeAgentAdapter, FrameEncoder, StreamError,
};
use agui_bridge::storage::config::ConfigService;
use agui_bridge::utils::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "agui-bridge")]
#[command(about = "Convert agent SDK stream-json into AGUI events", version)]
struct Args {
    /// Read upstream lines from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,
    /// Conversation thread id (generated when omitted)
    #[arg(long, env = "AGUI_THREAD_ID")]
    thread_id: Option<String>,
    /// Output format: sse or jsonl (overrides config)
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Config file path (default ~/.agui-bridge/config.json)
    #[arg(long, env = "AGUI_BRIDGE_CONFIG")]
    config: Option<PathBuf>,
    /// JSON value echoed as RUN_STARTED.input
    #[arg(long)]
    run_input: Option<String>,
}

/// Load config from `--config` or the default location. Failing to resolve the
/// default location falls back to defaults and reports why.
fn load_config(path: Option<PathBuf>) -> anyhow::Result<(BridgeConfig, Option<String>)> {
    match path {
        Some(path) => {
            let service = ConfigService::open(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            Ok((service.get_config_clone(), None))
        }
        None => match ConfigService::new() {
            Ok(service) => Ok((service.get_config_clone(), None)),
            Err(e) => Ok((BridgeConfig::default(), Some(e.to_string()))),
        },
    }
}

async fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Drain the event channel into stdout
async fn write_frames(mut rx: mpsc::Receiver<AguiEvent>, encoder: FrameEncoder) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(event) = rx.recv().await {
        let frame = encoder.encode(&event).context("failed to encode event")?;
        stdout.write_all(frame.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut config, config_warning) = load_config(args.config)?;
    if let Some(format) = args.format {
        config.output_format = format;
    }
    init_logging(&config.log_level);
    if let Some(reason) = config_warning {
        warn!(reason = %reason, "using default config");
    }

    let run_input: Option<serde_json::Value> = args
        .run_input
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("--run-input must be valid JSON")?;

    let adapter = match args.thread_id {
        Some(thread_id) => ClaudeAgentAdapter::new(thread_id),
        None => ClaudeAgentAdapter::default(),
    };

    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let encoder = FrameEncoder::new(config.output_format, config.sse_named_events);
    let writer = tokio::spawn(write_frames(rx, encoder));

    let mut service = AguiStreamingService::new(Box::new(adapter), Some(tx));
    service.start_run(run_input).await?;

    let mut lines = open_input(args.input.as_ref()).await?.lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                warn!("interrupted, aborting run");
                service.abort("Interrupted").await?;
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match service.process_line(&line).await {
                    Ok(_) => {}
                    Err(StreamError::Adapter(e)) if config.skip_malformed_lines => {
                        warn!(error = %e, "skipping malformed line");
                    }
                    Err(StreamError::Adapter(e)) => {
                        service.abort(&e.to_string()).await?;
                        break;
                    }
                    Err(e) => return Err(e.into()),
                },
                Ok(None) => {
                    service.finish().await?;
                    break;
                }
                Err(e) => {
                    service.abort(&format!("Input error: {}", e)).await?;
                    break;
                }
            }
        }
    }

    info!(
        thread_id = service.thread_id(),
        lines = service.lines_processed(),
        events = service.events_emitted(),
        "stream closed"
    );

    // Closing the sender lets the writer drain and exit
    drop(service);
    writer.await.context("writer task panicked")??;
    Ok(())
}
