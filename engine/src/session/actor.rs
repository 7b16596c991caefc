use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;

use super::commands::SessionCommand;
use super::state::SessionState;

/// The main session actor loop.
/// Owns all mutable state. Processes caller commands and worker output sequentially.
pub(crate) async fn run_session_actor(state: SessionState, cmd_rx: mpsc::Receiver<SessionCommand>) {
    run_session_actor_inner(state, cmd_rx)
        .instrument(tracing::info_span!("analysis_session"))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    tracing::debug!("Session actor started");

    loop {
        let deadline = state.handshake_deadline();

        tokio::select! {
            // Caller commands first: once a disable is seen no further
            // worker output is read.
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown { reply }) => {
                        tracing::debug!("Session actor shutting down");
                        state.disable().await;
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        tracing::debug!("All session handles dropped");
                        state.disable().await;
                        break;
                    }
                    Some(cmd) => handle_command(&mut state, cmd).await,
                }
            }

            _ = wait_for_deadline(deadline) => {
                state.fail("engine handshake timed out".to_string()).await;
            }

            event = state.next_worker_event() => {
                state.handle_worker_event(event).await;
            }
        }
    }

    tracing::debug!("Session actor exited");
}

async fn handle_command(state: &mut SessionState, cmd: SessionCommand) {
    match cmd {
        SessionCommand::SetEnabled { enabled, reply } => {
            if enabled {
                state.enable().await;
            } else {
                state.disable().await;
            }
            let _ = reply.send(());
        }
        SessionCommand::SetPosition { fen, reply } => {
            state.set_position(fen).await;
            let _ = reply.send(());
        }
        SessionCommand::Shutdown { .. } => unreachable!(),
    }
}

async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
