use tokio::sync::oneshot;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Session closed")]
    Closed,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Commands sent to the session actor. Each embeds a oneshot for the reply,
/// sent once the command has been fully applied.
pub(crate) enum SessionCommand {
    SetEnabled {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    SetPosition {
        fen: String,
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}
