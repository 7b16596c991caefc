//! In-memory workers for tests and embedders that host the engine elsewhere.
//!
//! Each spawned [`ChannelWorker`] is paired with a [`WorkerPeer`] that
//! receives the commands the session writes and injects engine output lines.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{EngineError, EngineWorker, WorkerFactory};
use crate::uci::UciCommand;

pub struct ChannelWorker {
    commands: Option<mpsc::UnboundedSender<String>>,
    lines: mpsc::UnboundedReceiver<String>,
    terminated: Arc<AtomicBool>,
}

/// The engine side of a [`ChannelWorker`].
pub struct WorkerPeer {
    commands: mpsc::UnboundedReceiver<String>,
    lines: Option<mpsc::UnboundedSender<String>>,
    terminated: Arc<AtomicBool>,
}

/// Create a connected worker/peer pair
pub fn channel_worker() -> (ChannelWorker, WorkerPeer) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let terminated = Arc::new(AtomicBool::new(false));

    let worker = ChannelWorker {
        commands: Some(cmd_tx),
        lines: line_rx,
        terminated: terminated.clone(),
    };
    let peer = WorkerPeer {
        commands: cmd_rx,
        lines: Some(line_tx),
        terminated,
    };
    (worker, peer)
}

#[async_trait]
impl EngineWorker for ChannelWorker {
    async fn send(&mut self, command: &UciCommand) -> Result<(), EngineError> {
        let tx = self.commands.as_ref().ok_or(EngineError::Closed)?;
        tx.send(command.to_string()).map_err(|_| EngineError::Closed)
    }

    async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    async fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.commands = None;
        self.lines.close();
    }
}

impl WorkerPeer {
    /// Next command written by the session, `None` once the worker is gone
    pub async fn next_command(&mut self) -> Option<String> {
        self.commands.recv().await
    }

    pub fn try_next_command(&mut self) -> Option<String> {
        self.commands.try_recv().ok()
    }

    /// Every command written so far that has not been read yet
    pub fn drain_commands(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(cmd) = self.commands.try_recv() {
            out.push(cmd);
        }
        out
    }

    /// Emit an engine output line. Returns `false` if the worker is gone.
    pub fn send_line(&self, line: impl Into<String>) -> bool {
        match &self.lines {
            Some(tx) => tx.send(line.into()).is_ok(),
            None => false,
        }
    }

    /// Simulate the engine exiting: the worker's output stream ends.
    pub fn close(&mut self) {
        self.lines = None;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// Hands out [`ChannelWorker`]s and delivers the matching peers.
#[derive(Clone)]
pub struct ChannelWorkerFactory {
    peers: mpsc::UnboundedSender<WorkerPeer>,
    failure: Option<String>,
}

impl ChannelWorkerFactory {
    /// Returns the factory and the stream of peers, one per spawned worker.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkerPeer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                peers: tx,
                failure: None,
            },
            rx,
        )
    }

    /// A factory whose every spawn fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self {
            peers: tx,
            failure: Some(reason.into()),
        }
    }
}

#[async_trait]
impl WorkerFactory for ChannelWorkerFactory {
    async fn spawn(&self) -> Result<Box<dyn EngineWorker>, EngineError> {
        if let Some(reason) = &self.failure {
            return Err(EngineError::Unavailable(reason.clone()));
        }
        let (worker, peer) = channel_worker();
        self.peers.send(peer).map_err(|_| EngineError::Closed)?;
        Ok(Box::new(worker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commands_and_lines_flow() {
        let (mut worker, mut peer) = channel_worker();

        worker.send(&UciCommand::Uci).await.unwrap();
        assert_eq!(peer.next_command().await.as_deref(), Some("uci"));

        assert!(peer.send_line("uciok"));
        assert_eq!(worker.next_line().await.as_deref(), Some("uciok"));
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let (mut worker, mut peer) = channel_worker();
        worker.terminate().await;
        worker.terminate().await;

        assert!(peer.is_terminated());
        assert!(matches!(
            worker.send(&UciCommand::Stop).await,
            Err(EngineError::Closed)
        ));
        assert_eq!(peer.next_command().await, None);
    }

    #[tokio::test]
    async fn test_peer_close_ends_output() {
        let (mut worker, mut peer) = channel_worker();
        peer.send_line("readyok");
        peer.close();
        assert_eq!(worker.next_line().await.as_deref(), Some("readyok"));
        assert_eq!(worker.next_line().await, None);
        assert!(!peer.send_line("uciok"));
    }

    #[tokio::test]
    async fn test_failing_factory() {
        let factory = ChannelWorkerFactory::failing("wasm fetch failed");
        assert!(matches!(
            factory.spawn().await,
            Err(EngineError::Unavailable(reason)) if reason == "wasm fetch failed"
        ));
    }
}
