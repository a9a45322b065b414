use tokio::sync::oneshot;

use super::difficulty::Difficulty;
use super::snapshot::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),
    #[error("Move oracle unavailable: {0}")]
    OracleUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result of a successful move request.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub snapshot: SessionSnapshot,
    /// Reply the automated player made, if any
    pub oracle_move: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DifficultyChange {
    pub snapshot: SessionSnapshot,
    /// False when the oracle is missing or rejected the new parameters
    pub oracle_configured: bool,
}

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
pub enum SessionCommand {
    ApplyMove {
        token: String,
        reply: oneshot::Sender<Result<MoveOutcome, SessionError>>,
    },
    SetDifficulty {
        difficulty: Difficulty,
        reply: oneshot::Sender<DifficultyChange>,
    },
    QueryOracleMove {
        reply: oneshot::Sender<Result<String, SessionError>>,
    },
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Shutdown,
}
