use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;

use super::actor::run_session_actor;
use super::commands::{SessionCommand, SessionError};
use super::state::SessionState;
use super::EngineState;
use crate::config::SessionConfig;
use crate::result::PositionAnalysis;
use crate::worker::{ProcessWorkerFactory, WorkerFactory};

/// Cheap, cloneable handle to an analysis session.
///
/// The session shuts down (and its engine with it) when the last handle is
/// dropped or [`AnalysisSession::shutdown`] is called.
#[derive(Clone)]
pub struct AnalysisSession {
    cmd_tx: mpsc::Sender<SessionCommand>,
    result_rx: watch::Receiver<Option<PositionAnalysis>>,
    state_rx: watch::Receiver<EngineState>,
}

impl AnalysisSession {
    /// Start a session actor on the current tokio runtime. The session
    /// starts disabled; no worker exists until [`set_enabled(true)`].
    ///
    /// [`set_enabled(true)`]: AnalysisSession::set_enabled
    pub fn spawn(factory: impl WorkerFactory + 'static, config: SessionConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (result_tx, result_rx) = watch::channel(None);
        let (state_tx, state_rx) = watch::channel(EngineState::Uninitialized);

        let state = SessionState::new(Box::new(factory), config, result_tx, state_tx);
        tokio::spawn(run_session_actor(state, cmd_rx));

        Self {
            cmd_tx,
            result_rx,
            state_rx,
        }
    }

    /// Session backed by an engine binary, per `config.engine_path`.
    pub fn with_process_engine(config: SessionConfig) -> Self {
        let factory = ProcessWorkerFactory::from_config(&config);
        Self::spawn(factory, config)
    }

    /// Turn analysis on or off. Disabling terminates the engine and clears
    /// the latest result before returning.
    pub async fn set_enabled(&self, enabled: bool) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::SetEnabled { enabled, reply: tx })
            .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    /// Analyse `fen`. Queued until the engine is ready; the FEN is passed
    /// through unvalidated.
    pub async fn set_position(&self, fen: impl Into<String>) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::SetPosition {
            fen: fen.into(),
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    /// Latest evaluation, if any
    pub fn latest(&self) -> Option<PositionAnalysis> {
        self.result_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PositionAnalysis>> {
        self.result_rx.clone()
    }

    /// Stream of evaluation updates, starting with the current value
    pub fn results(&self) -> WatchStream<Option<PositionAnalysis>> {
        WatchStream::new(self.result_rx.clone())
    }

    pub fn state(&self) -> EngineState {
        self.state_rx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<EngineState> {
        self.state_rx.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.state_rx.borrow().is_ready()
    }

    /// Terminate the engine and stop the session actor.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Shutdown { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.cmd_tx.send(cmd).await.map_err(|_| SessionError::Closed)
    }
}
