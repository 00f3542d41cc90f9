//! ircseen - JSON-lines front end for the seen engine.
//!
//! Reads one inbound event per line on stdin and writes one reply per line
//! on stdout. Logs go to stderr.

use ircseen::config::{Config, LogFormat, validate};
use ircseen::db::Database;
use ircseen::engine::SeenEngine;
use ircseen::event::{InboundEvent, Reply};
use ircseen::history::{HistoryWriter, SqliteSeenStore};
use ircseen::telemetry;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let explicit_path = std::env::args().nth(1);
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| "config.toml".to_string());

    let config = if explicit_path.is_none() && !Path::new(&config_path).exists() {
        Config::default()
    } else {
        match Config::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                telemetry::init(LogFormat::Pretty);
                error!(path = %config_path, error = %e, "Failed to load config");
                return Err(e.into());
            }
        }
    };

    telemetry::init(config.log.format);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        database = %config.database.path,
        networks = config.networks.len(),
        "Starting ircseen"
    );

    run(&config, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Serve events from `input` until EOF, a read error or Ctrl-C, then drain
/// the engine and flush the history writer.
async fn run<R, W>(config: &Config, input: R, output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let db = Database::new(&config.database.path).await?;
    let store = Arc::new(SqliteSeenStore::new(db.clone()));
    let (writer, writer_task) = HistoryWriter::spawn(store, &config.history);

    let (reply_tx, reply_rx) = mpsc::channel(config.engine.event_queue);
    let engine = SeenEngine::new(Arc::new(writer), config);
    let (events, engine_task) = engine.spawn(config.engine.event_queue, reply_tx);
    let output_task = tokio::spawn(write_replies(reply_rx, output));

    tokio::select! {
        result = read_events(input, events) => {
            if let Err(e) = result {
                error!(error = %e, "Failed to read events, shutting down");
            }
        }
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    // The event sender is gone at this point; wait for the engine to drain,
    // then for the writer to commit what is still buffered.
    engine_task.await?;
    writer_task.await?;
    output_task.await??;
    db.close().await;
    Ok(())
}

/// Feed input lines to the engine until EOF.
async fn read_events<R>(input: R, events: mpsc::Sender<InboundEvent>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundEvent>(line) {
            Ok(event) => {
                if events.send(event).await.is_err() {
                    warn!("Engine stopped, no longer reading input");
                    break;
                }
            }
            Err(e) => warn!(error = %e, "Skipping malformed event"),
        }
    }

    Ok(())
}

async fn write_replies<W>(mut replies: mpsc::Receiver<Reply>, mut output: W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = replies.recv().await {
        let mut line = serde_json::to_vec(&reply)?;
        line.push(b'\n');
        output.write_all(&line).await?;
        output.flush().await?;
    }
    Ok(())
}
