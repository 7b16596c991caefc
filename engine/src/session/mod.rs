//! Engine Session Manager.
//!
//! One actor task per session owns the worker and all mutable state; the
//! [`AnalysisSession`] handle talks to it over channels and reads published
//! state from watch channels.

mod actor;
mod commands;
mod handle;
mod state;

pub use commands::SessionError;
pub use handle::AnalysisSession;

/// Lifecycle of the engine behind a session.
///
/// `Uninitialized → AwaitingUciOk → AwaitingReadyOk → Ready ⇄ Searching`,
/// with `Terminated` after a disable and `Failed` when the engine could not
/// be started or went away.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Never enabled
    #[default]
    Uninitialized,
    /// `uci` sent
    AwaitingUciOk,
    /// Options and `isready` sent
    AwaitingReadyOk,
    Ready,
    /// A `go` is outstanding for search number `generation`
    Searching { generation: u64 },
    Failed(String),
    Terminated,
}

impl EngineState {
    /// True once the handshake has completed
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineState::Ready | EngineState::Searching { .. })
    }

    pub fn is_handshaking(&self) -> bool {
        matches!(
            self,
            EngineState::AwaitingUciOk | EngineState::AwaitingReadyOk
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EngineState::Failed(_))
    }
}
