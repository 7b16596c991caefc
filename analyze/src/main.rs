//! chess-analyze: live engine analysis of a position and the line that follows.
//!
//! Enables an analysis session over a UCI engine binary, submits the starting
//! position, then plays each move and submits the new position, printing
//! every evaluation as the engine reports it. Exits once the final position
//! reaches full depth or its search ends.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use engine::{AnalysisSession, EngineState, PositionAnalysis, SessionConfig, SEARCH_DEPTH};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod position;

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Parser)]
#[command(name = "chess-analyze", about = "Live UCI engine analysis of a chess position")]
struct Cli {
    /// Starting position in FEN
    #[arg(long, default_value = STARTPOS)]
    fen: String,

    /// Moves to play from the starting position, in UCI notation (e2e4 e7e5 ...)
    #[arg(long, num_args = 1..)]
    moves: Vec<String>,

    /// Engine binary. Overrides CHESS_ENGINE_PATH.
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Engine threads. Overrides CHESS_ENGINE_THREADS.
    #[arg(long)]
    threads: Option<u32>,

    /// Engine hash size in MB. Overrides CHESS_ENGINE_HASH_MB.
    #[arg(long)]
    hash_mb: Option<u32>,

    /// Milliseconds to analyse each intermediate position
    #[arg(long, default_value_t = 500)]
    step_ms: u64,

    /// Seconds to wait for the final position. Overrides CHESS_ANALYZE_SETTLE_SECS.
    #[arg(long)]
    settle_secs: Option<u64>,

    /// Print one JSON object per evaluation
    #[arg(long)]
    json: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("engine session failed: {0}")]
    EngineFailed(String),

    #[error("timed out after {0}s waiting for the final position")]
    Timeout(u64),

    #[error("analysis session closed unexpectedly")]
    SessionClosed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing();

    let positions = position::positions_along(&cli.fen, &cli.moves)?;
    let session = AnalysisSession::with_process_engine(session_config(&cli));
    let printer = tokio::spawn(print_results(session.results(), cli.json));

    let outcome = analyse_line(&session, &positions, &cli).await;

    session.shutdown().await?;
    let _ = printer.await;
    outcome
}

fn session_config(cli: &Cli) -> SessionConfig {
    let mut config = SessionConfig::from_env();
    if let Some(path) = &cli.engine {
        config.engine_path = Some(path.clone());
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }
    if cli.hash_mb.is_some() {
        config.hash_mb = cli.hash_mb;
    }
    config
}

async fn analyse_line(
    session: &AnalysisSession,
    positions: &[String],
    cli: &Cli,
) -> anyhow::Result<()> {
    session.set_enabled(true).await?;
    ensure_running(session)?;

    let Some((last, earlier)) = positions.split_last() else {
        return Ok(());
    };

    for fen in earlier {
        tracing::info!(fen = %fen, "Submitting position");
        session.set_position(fen.as_str()).await?;
        tokio::time::sleep(Duration::from_millis(cli.step_ms)).await;
        ensure_running(session)?;
    }

    tracing::info!(fen = %last, "Submitting final position");
    session.set_position(last.as_str()).await?;

    let settle_secs = cli.settle_secs.unwrap_or_else(config::get_settle_secs);
    wait_for_final(session, last, settle_secs).await
}

/// Wait until the final position is settled (see [`final_search_settled`])
/// or the session fails.
async fn wait_for_final(
    session: &AnalysisSession,
    fen: &str,
    settle_secs: u64,
) -> anyhow::Result<()> {
    let mut state = session.watch_state();
    let mut results = session.subscribe();

    let wait = async {
        loop {
            let state_now = state.borrow_and_update().clone();
            if final_search_settled(&state_now, session.latest().as_ref(), fen) {
                return Ok::<_, CliError>(state_now);
            }
            tokio::select! {
                changed = state.changed() => changed.map_err(|_| CliError::SessionClosed)?,
                changed = results.changed() => changed.map_err(|_| CliError::SessionClosed)?,
            }
        }
    };
    let done = tokio::time::timeout(Duration::from_secs(settle_secs), wait)
        .await
        .map_err(|_| CliError::Timeout(settle_secs))??;

    if let EngineState::Failed(reason) = done {
        return Err(CliError::EngineFailed(reason).into());
    }
    if let Some(analysis) = session.latest() {
        if analysis.result.depth < SEARCH_DEPTH {
            tracing::warn!(
                depth = analysis.result.depth,
                "Engine finished below the requested depth"
            );
        }
    }
    Ok(())
}

/// The final position is settled once it has a result at full depth, or its
/// search has ended (engine back to `Ready`) with a shallower result, as for
/// forced mates. A failed session is settled too.
fn final_search_settled(
    state: &EngineState,
    latest: Option<&PositionAnalysis>,
    fen: &str,
) -> bool {
    if state.is_failed() {
        return true;
    }
    let Some(analysis) = latest.filter(|a| a.fen == fen) else {
        return false;
    };
    analysis.result.depth >= SEARCH_DEPTH || *state == EngineState::Ready
}

fn ensure_running(session: &AnalysisSession) -> Result<(), CliError> {
    match session.state() {
        EngineState::Failed(reason) => Err(CliError::EngineFailed(reason)),
        _ => Ok(()),
    }
}

async fn print_results(mut results: WatchStream<Option<PositionAnalysis>>, json: bool) {
    let mut current_fen: Option<String> = None;

    while let Some(update) = results.next().await {
        let Some(analysis) = update else {
            continue;
        };

        if json {
            match serde_json::to_string(&analysis) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!("Failed to serialize result: {}", e),
            }
            continue;
        }

        if current_fen.as_deref() != Some(analysis.fen.as_str()) {
            println!("{}", analysis.fen);
            current_fen = Some(analysis.fen.clone());
        }
        println!("  {}", analysis.result);
    }
}

/// Logs go to a daily rolling file when `CHESS_ANALYZE_LOG_DIR` is set,
/// otherwise to stderr so stdout stays machine-readable.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match config::get_log_dir() {
        Some(log_dir) => {
            std::fs::create_dir_all(&log_dir).ok();
            let file_appender = tracing_appender::rolling::daily(&log_dir, "chess-analyze");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter())
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter())
                .init();
            None
        }
    }
}
