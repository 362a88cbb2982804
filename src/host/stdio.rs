//! Line-delimited JSON host loop over stdin/stdout.
//!
//! Stdout is reserved for protocol events; diagnostics go to stderr.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::LanternConfig;
use crate::error::{LanternError, Result};
use crate::host::contract::{EventEnvelope, HostCommand, HostEvent};
use crate::host::session::{Flow, LauncherSession};
use crate::presenter::JsonLinesPresenter;
use crate::providers::build_registry;

/// Builds a session from `config` and serves it on stdin/stdout until
/// stdin closes or a `stop` command arrives.
///
/// # Errors
///
/// Fails on invalid configuration or when stdout can no longer be written.
pub async fn run_stdio(config: LanternConfig) -> Result<()> {
    let registry = build_registry(&config)?;
    let (presenter, events) = JsonLinesPresenter::channel();
    let presenter = Arc::new(presenter);
    let session = LauncherSession::new(&config, registry, Arc::clone(&presenter))?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = BufWriter::new(tokio::io::stdout());
    run_host(session, presenter, events, stdin, stdout).await
}

/// Serves `session` on arbitrary reader/writer halves.
///
/// Two tasks cooperate:
///
/// 1. **Writer** -- drains the presenter's event queue and writes each event
///    as one JSON line.
/// 2. **Reader** -- runs on the calling task, parses one command per line
///    and applies it to the session.
///
/// When the reader finishes, state is saved, the writer flushes what is
/// already queued and the function returns.
pub async fn run_host<R, W>(
    mut session: LauncherSession,
    presenter: Arc<JsonLinesPresenter>,
    events: mpsc::UnboundedReceiver<HostEvent>,
    input: R,
    output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let shutdown = CancellationToken::new();
    let writer = tokio::spawn(write_events(events, output, shutdown.clone()));

    let reader_result = read_commands(&mut session, &presenter, input).await;

    if let Err(e) = session.save() {
        tracing::warn!(error = %e, "failed to persist launcher state on shutdown");
    }
    shutdown.cancel();
    let writer_result = writer
        .await
        .map_err(|e| LanternError::Channel(format!("event writer task failed: {e}")))?;

    reader_result?;
    writer_result
}

async fn read_commands<R>(
    session: &mut LauncherSession,
    presenter: &JsonLinesPresenter,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let command: HostCommand = match serde_json::from_str(trimmed) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse host command");
                presenter.emit(HostEvent::Error {
                    message: format!("failed to parse command: {e}"),
                });
                continue;
            }
        };

        if session.handle(command) == Flow::Stop {
            tracing::info!("stop received; shutting down host");
            return Ok(());
        }
    }
    tracing::info!("input closed (EOF); shutting down host");
    Ok(())
}

async fn write_events<W>(
    mut events: mpsc::UnboundedReceiver<HostEvent>,
    mut output: W,
    shutdown: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => write_event(&mut output, event).await?,
                None => break,
            },
            () = shutdown.cancelled() => {
                while let Ok(event) = events.try_recv() {
                    write_event(&mut output, event).await?;
                }
                break;
            }
        }
    }
    output.flush().await?;
    Ok(())
}

async fn write_event<W>(output: &mut W, event: HostEvent) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let json = serde_json::to_string(&EventEnvelope::from(event))?;
    output.write_all(json.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
