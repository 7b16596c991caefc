use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{EngineError, EngineWorker, WorkerFactory};
use crate::config::SessionConfig;
use crate::uci::UciCommand;

/// How long a `quit` gets before the process is killed
const QUIT_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Common install locations checked before `PATH`
const KNOWN_ENGINE_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

/// An engine running as a child process, talking over stdin/stdout.
pub struct ProcessWorker {
    process: Child,
    stdin_tx: Option<mpsc::Sender<String>>,
    line_rx: mpsc::Receiver<String>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
    terminated: bool,
}

impl ProcessWorker {
    /// Spawn the engine binary at `path`.
    ///
    /// Only starts the process and its I/O tasks; the UCI handshake is driven
    /// by the session.
    #[tracing::instrument(level = "info")]
    pub async fn spawn(path: &Path) -> Result<Self, EngineError> {
        tracing::debug!("Spawning engine process");
        let mut process = tokio::process::Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                EngineError::Spawn(e)
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

        let (line_tx, line_rx) = mpsc::channel::<String>(256);
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);

        let reader = tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::debug!("Engine stdout EOF - engine closed");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        tracing::trace!("UCI << {}", trimmed);
                        if line_tx.send(trimmed.to_string()).await.is_err() {
                            // Nobody is listening any more
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Error reading from engine stdout: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Output reader task exiting");
        });

        let writer = tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                tracing::trace!("UCI >> {}", cmd);
                if let Err(e) = stdin.write_all(format!("{}\n", cmd).as_bytes()).await {
                    tracing::error!("Failed to write to engine stdin: {}", e);
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!("Failed to flush engine stdin: {}", e);
                    break;
                }
            }
            tracing::debug!("Stdin writer task exiting");
        });

        tracing::info!("Engine process started");
        Ok(Self {
            process,
            stdin_tx: Some(stdin_tx),
            line_rx,
            reader,
            writer,
            terminated: false,
        })
    }
}

#[async_trait]
impl EngineWorker for ProcessWorker {
    async fn send(&mut self, command: &UciCommand) -> Result<(), EngineError> {
        let tx = self.stdin_tx.as_ref().ok_or(EngineError::Closed)?;
        tx.send(command.to_string())
            .await
            .map_err(|_| EngineError::Closed)
    }

    async fn next_line(&mut self) -> Option<String> {
        self.line_rx.recv().await
    }

    async fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        tracing::debug!("Terminating engine process");

        // Dropping the sender lets the writer flush "quit" and exit
        if let Some(tx) = self.stdin_tx.take() {
            let _ = tx.send(UciCommand::Quit.to_string()).await;
        }
        let _ = tokio::time::timeout(QUIT_GRACE_PERIOD, self.process.wait()).await;
        let _ = self.process.kill().await;

        self.reader.abort();
        self.writer.abort();
        self.line_rx.close();
        tracing::info!("Engine process terminated");
    }
}

/// Spawns a [`ProcessWorker`] per session.
#[derive(Debug, Clone, Default)]
pub struct ProcessWorkerFactory {
    path: Option<PathBuf>,
}

impl ProcessWorkerFactory {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.engine_path.clone())
    }
}

#[async_trait]
impl WorkerFactory for ProcessWorkerFactory {
    async fn spawn(&self) -> Result<Box<dyn EngineWorker>, EngineError> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => find_engine_path().ok_or(EngineError::NotFound)?,
        };
        let worker = ProcessWorker::spawn(&path).await?;
        Ok(Box::new(worker))
    }
}

/// Find a Stockfish executable in common locations, then on `PATH`
pub fn find_engine_path() -> Option<PathBuf> {
    for path_str in KNOWN_ENGINE_PATHS {
        let path = Path::new(path_str);
        if path.is_file() {
            return Some(path.to_path_buf());
        }
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join("stockfish"))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_fails_to_spawn() {
        let factory = ProcessWorkerFactory::new(Some(PathBuf::from(
            "/nonexistent/definitely-not-an-engine",
        )));
        let result = factory.spawn().await;
        assert!(matches!(result, Err(EngineError::Spawn(_))));
    }
}
