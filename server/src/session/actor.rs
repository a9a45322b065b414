use tokio::sync::mpsc;
use tracing::Instrument;

use super::commands::{DifficultyChange, MoveOutcome, SessionCommand};
use super::state::SessionState;

/// The main session actor loop.
/// Owns all mutable state and processes commands one at a time.
pub(crate) async fn run_session_actor(state: SessionState, cmd_rx: mpsc::Receiver<SessionCommand>) {
    let session_id = state.session_id.clone();
    run_session_actor_inner(state, cmd_rx)
        .instrument(tracing::info_span!("session", id = %session_id))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    tracing::info!("Session actor started");

    loop {
        match cmd_rx.recv().await {
            Some(SessionCommand::Shutdown) | None => {
                tracing::info!("Session actor shutting down");
                state.shutdown_oracle().await;
                break;
            }
            Some(cmd) => {
                handle_command(&mut state, cmd).await;
                state.shutdown_oracle_if_ended().await;
            }
        }
    }

    tracing::info!("Session actor exited");
}

async fn handle_command(state: &mut SessionState, cmd: SessionCommand) {
    match cmd {
        SessionCommand::ApplyMove { token, reply } => {
            let result = match state.apply_move(&token) {
                Ok(_) => {
                    let oracle_move = state.play_oracle_turn().await;
                    Ok(MoveOutcome {
                        snapshot: state.snapshot(),
                        oracle_move,
                    })
                }
                Err(e) => {
                    tracing::debug!("Rejected move {:?}: {}", token, e);
                    Err(e)
                }
            };
            let _ = reply.send(result);
        }
        SessionCommand::SetDifficulty { difficulty, reply } => {
            let oracle_configured = state.set_difficulty(difficulty).await;
            let _ = reply.send(DifficultyChange {
                snapshot: state.snapshot(),
                oracle_configured,
            });
        }
        SessionCommand::QueryOracleMove { reply } => {
            let _ = reply.send(state.query_oracle_move().await);
        }
        SessionCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        // Handled by the loop
        SessionCommand::Shutdown => {}
    }
}
