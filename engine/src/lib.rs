//! Background chess-engine analysis sessions.
//!
//! An [`AnalysisSession`] owns one UCI engine worker while enabled, runs the
//! `uci`/`isready` handshake, searches every submitted position to a fixed
//! depth and publishes parsed [`EngineResult`] snapshots as they arrive.

pub mod config;
pub mod result;
pub mod session;
pub mod uci;
pub mod worker;

pub use config::{SessionConfig, SEARCH_DEPTH};
pub use result::{EngineResult, PositionAnalysis, MATE_SCORE};
pub use session::{AnalysisSession, EngineState, SessionError};
pub use uci::{parse_uci_message, InfoLine, ScoreBound, UciCommand, UciError, UciMessage};
pub use worker::{
    ChannelWorkerFactory, EngineError, EngineWorker, ProcessWorkerFactory, WorkerFactory,
    WorkerPeer,
};
