use tokio::sync::{mpsc, oneshot};

use super::commands::{DifficultyChange, MoveOutcome, SessionCommand, SessionError};
use super::difficulty::Difficulty;
use super::snapshot::SessionSnapshot;

/// Cheap, cloneable handle to a session actor.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: String,
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(id: String, cmd_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { id, cmd_tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Play `token`, followed by the automated player's reply when due.
    pub async fn apply_move(&self, token: impl Into<String>) -> Result<MoveOutcome, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::ApplyMove {
            token: token.into(),
            reply: tx,
        })
        .await?;
        rx.await.map_err(reply_dropped)?
    }

    pub async fn set_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> Result<DifficultyChange, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::SetDifficulty {
            difficulty,
            reply: tx,
        })
        .await?;
        rx.await.map_err(reply_dropped)
    }

    /// Ask the oracle what it would play, without playing it.
    pub async fn query_oracle_move(&self) -> Result<String, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::QueryOracleMove { reply: tx })
            .await?;
        rx.await.map_err(reply_dropped)?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::GetSnapshot { reply: tx }).await?;
        rx.await.map_err(reply_dropped)
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::Internal("Session actor is gone".into()))
    }
}

fn reply_dropped(_: oneshot::error::RecvError) -> SessionError {
    SessionError::Internal("Reply dropped".into())
}
