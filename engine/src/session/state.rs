use tokio::sync::watch;
use tokio::time::Instant;

use super::EngineState;
use crate::config::{SessionConfig, SEARCH_DEPTH};
use crate::result::{EngineResult, PositionAnalysis};
use crate::uci::{parse_uci_message, UciCommand, UciMessage};
use crate::worker::{EngineWorker, WorkerFactory};

/// What the worker produced on its output stream
pub(crate) enum WorkerEvent {
    Line(String),
    Exited,
}

/// All mutable state of one session. Owned by the actor.
pub(crate) struct SessionState {
    factory: Box<dyn WorkerFactory>,
    config: SessionConfig,
    worker: Option<Box<dyn EngineWorker>>,
    state: EngineState,
    enabled: bool,
    /// Position waiting for the handshake to complete
    pending_position: Option<String>,
    /// Position of the newest search
    current_position: Option<String>,
    /// Number of `go` commands sent to the current worker.
    ///
    /// Together with `searches_finished` this attributes info lines to
    /// searches. It relies on the engine answering each `go` with exactly one
    /// `bestmove` and staying silent on a `stop` while idle; an engine that
    /// replies `bestmove` to an idle `stop` has its new search's output dropped.
    searches_started: u64,
    /// Number of `bestmove` replies received from the current worker
    searches_finished: u64,
    /// Deepest result published for the newest search
    last_depth: Option<u32>,
    handshake_deadline: Option<Instant>,
    result_tx: watch::Sender<Option<PositionAnalysis>>,
    state_tx: watch::Sender<EngineState>,
}

impl SessionState {
    pub(crate) fn new(
        factory: Box<dyn WorkerFactory>,
        config: SessionConfig,
        result_tx: watch::Sender<Option<PositionAnalysis>>,
        state_tx: watch::Sender<EngineState>,
    ) -> Self {
        Self {
            factory,
            config,
            worker: None,
            state: EngineState::Uninitialized,
            enabled: false,
            pending_position: None,
            current_position: None,
            searches_started: 0,
            searches_finished: 0,
            last_depth: None,
            handshake_deadline: None,
            result_tx,
            state_tx,
        }
    }

    pub(crate) fn handshake_deadline(&self) -> Option<Instant> {
        self.handshake_deadline
    }

    pub(crate) async fn next_worker_event(&mut self) -> WorkerEvent {
        match self.worker.as_mut() {
            Some(worker) => match worker.next_line().await {
                Some(line) => WorkerEvent::Line(line),
                None => WorkerEvent::Exited,
            },
            None => std::future::pending().await,
        }
    }

    pub(crate) async fn enable(&mut self) {
        if self.enabled && self.worker.is_some() {
            tracing::debug!("Session already enabled");
            return;
        }
        self.enabled = true;

        // A previous worker may linger after a failure
        self.release_worker().await;
        self.publish_result(None);
        self.current_position = None;
        self.searches_started = 0;
        self.searches_finished = 0;
        self.last_depth = None;

        tracing::info!("Starting engine worker");
        let worker = match self.factory.spawn().await {
            Ok(worker) => worker,
            Err(e) => {
                self.fail(format!("engine failed to start: {}", e)).await;
                return;
            }
        };
        self.worker = Some(worker);
        self.handshake_deadline = Some(Instant::now() + self.config.handshake_timeout);
        self.set_state(EngineState::AwaitingUciOk);
        self.send(UciCommand::Uci).await;
    }

    pub(crate) async fn disable(&mut self) {
        // Nothing queued survives a disable, even one issued while disabled
        self.pending_position = None;
        if !self.enabled && self.worker.is_none() {
            tracing::debug!("Session already disabled");
            return;
        }
        tracing::info!("Disabling session");

        self.enabled = false;
        self.release_worker().await;
        self.pending_position = None;
        self.current_position = None;
        self.publish_result(None);
        self.set_state(EngineState::Terminated);
    }

    pub(crate) async fn set_position(&mut self, fen: String) {
        if self.enabled && self.state.is_ready() {
            self.start_search(fen).await;
        } else {
            tracing::debug!(state = ?self.state, "Engine not ready, queueing position");
            self.pending_position = Some(fen);
        }
    }

    /// Give up on the current worker
    pub(crate) async fn fail(&mut self, reason: String) {
        tracing::error!("Engine session failed: {}", reason);
        self.release_worker().await;
        self.pending_position = None;
        self.current_position = None;
        self.publish_result(None);
        self.set_state(EngineState::Failed(reason));
    }

    pub(crate) async fn handle_worker_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Line(line) => self.handle_line(&line).await,
            WorkerEvent::Exited => {
                let reason = if self.state.is_handshaking() {
                    "engine exited during handshake"
                } else {
                    "engine exited unexpectedly"
                };
                self.fail(reason.to_string()).await;
            }
        }
    }

    async fn handle_line(&mut self, line: &str) {
        let msg = match parse_uci_message(line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::trace!("Ignoring engine output: {}", e);
                return;
            }
        };

        match msg {
            UciMessage::UciOk => {
                if self.state != EngineState::AwaitingUciOk {
                    tracing::debug!(state = ?self.state, "Ignoring stray uciok");
                    return;
                }
                self.configure().await;
            }
            UciMessage::ReadyOk => {
                if self.state != EngineState::AwaitingReadyOk {
                    tracing::debug!(state = ?self.state, "Ignoring stray readyok");
                    return;
                }
                self.handshake_deadline = None;
                self.set_state(EngineState::Ready);
                tracing::info!("Engine ready");
                if let Some(fen) = self.pending_position.take() {
                    self.start_search(fen).await;
                }
            }
            UciMessage::Id { name, value } => {
                tracing::debug!("Engine {}: {}", name, value);
            }
            UciMessage::BestMove { mv, .. } => {
                if self.searches_finished < self.searches_started {
                    self.searches_finished += 1;
                }
                if self.searches_finished == self.searches_started {
                    if let EngineState::Searching { generation } = self.state {
                        tracing::debug!(generation, bestmove = %mv, "Search finished");
                        self.set_state(EngineState::Ready);
                    }
                }
            }
            UciMessage::Info(info) => {
                let EngineState::Searching { generation } = self.state else {
                    return;
                };
                // Output belongs to the oldest search that has not answered bestmove
                if self.searches_finished + 1 != self.searches_started {
                    tracing::trace!(generation, "Dropping info from superseded search");
                    return;
                }
                let Some(result) = EngineResult::from_info(&info) else {
                    return;
                };
                if self.last_depth.is_some_and(|depth| result.depth <= depth) {
                    return;
                }
                let Some(fen) = self.current_position.clone() else {
                    return;
                };

                tracing::debug!(
                    generation,
                    depth = result.depth,
                    evaluation = result.evaluation,
                    nodes = ?info.nodes,
                    "New evaluation"
                );
                self.last_depth = Some(result.depth);
                self.publish_result(Some(PositionAnalysis { fen, result }));
            }
        }
    }

    /// `uciok` received: restrict to one line, apply tuning, ask for readiness
    async fn configure(&mut self) {
        self.send(UciCommand::set_option("MultiPV", 1)).await;
        if let Some(threads) = self.config.threads_option() {
            self.send(UciCommand::set_option("Threads", threads)).await;
        }
        if let Some(hash_mb) = self.config.hash_option() {
            self.send(UciCommand::set_option("Hash", hash_mb)).await;
        }
        if self.worker.is_some() {
            self.set_state(EngineState::AwaitingReadyOk);
            self.send(UciCommand::IsReady).await;
        }
    }

    async fn start_search(&mut self, fen: String) {
        tracing::info!(fen = %fen, depth = SEARCH_DEPTH, "Starting search");
        self.send(UciCommand::Stop).await;
        self.send(UciCommand::Position { fen: fen.clone() }).await;
        self.send(UciCommand::Go {
            depth: SEARCH_DEPTH,
        })
        .await;
        if self.worker.is_none() {
            return;
        }

        self.searches_started += 1;
        self.last_depth = None;
        self.current_position = Some(fen);
        self.set_state(EngineState::Searching {
            generation: self.searches_started,
        });
    }

    /// Write a command; a dead worker fails the session.
    async fn send(&mut self, command: UciCommand) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        tracing::debug!("UCI >> {}", command);
        if let Err(e) = worker.send(&command).await {
            self.fail(format!("failed to send '{}': {}", command, e)).await;
        }
    }

    async fn release_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.terminate().await;
        }
        self.handshake_deadline = None;
    }

    fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Engine state change");
            self.state = state.clone();
            self.state_tx.send_replace(state);
        }
    }

    fn publish_result(&self, result: Option<PositionAnalysis>) {
        self.result_tx.send_if_modified(|current| {
            if *current == result {
                return false;
            }
            *current = result;
            true
        });
    }
}
