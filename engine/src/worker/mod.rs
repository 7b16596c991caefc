//! The boundary between a session and the engine it drives.
//!
//! A worker is an isolated unit that only understands the line protocol:
//! commands go in, text lines come out. Sessions get workers from a
//! [`WorkerFactory`], so the same session logic runs against a real engine
//! binary or an in-memory peer.

pub mod channel;
pub mod process;

pub use channel::{channel_worker, ChannelWorker, ChannelWorkerFactory, WorkerPeer};
pub use process::{find_engine_path, ProcessWorker, ProcessWorkerFactory};

use async_trait::async_trait;

use crate::uci::UciCommand;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine binary not found")]
    NotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
    #[error("Engine worker closed")]
    Closed,
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
}

/// A running engine speaking the UCI line protocol.
#[async_trait]
pub trait EngineWorker: Send {
    /// Queue a command for the engine. Commands are delivered in order.
    async fn send(&mut self, command: &UciCommand) -> Result<(), EngineError>;

    /// Next line of engine output, `None` once the engine has gone away.
    ///
    /// Must be cancel-safe: sessions poll it inside `select!`.
    async fn next_line(&mut self) -> Option<String>;

    /// Stop the engine and release everything it holds. Idempotent.
    async fn terminate(&mut self);
}

/// Creates a fresh worker for every (re)enabled session.
#[async_trait]
pub trait WorkerFactory: Send + Sync {
    async fn spawn(&self) -> Result<Box<dyn EngineWorker>, EngineError>;
}
