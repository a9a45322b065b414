use std::time::Duration;

use chess::{format_uci_move, Game, Outcome, Side};
use engine::{MoveOracle, OracleError};

use super::commands::SessionError;
use super::difficulty::Difficulty;
use super::snapshot::SessionSnapshot;

/// The automated player always takes the side that moves second.
const ORACLE_SIDE: Side = Side::Black;

/// Internal mutable state, owned entirely by the session actor. No locks.
pub(crate) struct SessionState {
    pub session_id: String,
    pub game: Game,
    pub difficulty: Difficulty,
    /// Set once, when the game reaches a terminal position
    pub outcome: Option<Outcome>,
    pub oracle: Option<Box<dyn MoveOracle>>,
    pub oracle_timeout: Duration,
}

impl SessionState {
    pub fn new(
        session_id: String,
        oracle: Option<Box<dyn MoveOracle>>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            session_id,
            game: Game::new(),
            difficulty: Difficulty::default(),
            outcome: None,
            oracle,
            oracle_timeout,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.outcome.is_some()
    }

    /// Validate and apply a move token. Returns the canonical token.
    ///
    /// Nothing changes on error.
    pub fn apply_move(&mut self, token: &str) -> Result<String, SessionError> {
        if self.is_terminated() {
            return Err(SessionError::InvalidMove(format!("{}: game is over", token)));
        }

        let entry = self
            .game
            .play(token)
            .map_err(|e| SessionError::InvalidMove(e.to_string()))?;
        let applied = entry.token.clone();
        tracing::debug!(side = %entry.side, mv = %applied, "Move applied");

        if let Some(outcome) = self.game.outcome() {
            tracing::info!(
                result = outcome.result.as_str(),
                termination = ?outcome.termination,
                "Game over"
            );
            self.outcome = Some(outcome);
        }
        Ok(applied)
    }

    /// Ask the oracle for a move in the current position without playing it.
    pub async fn query_oracle_move(&mut self) -> Result<String, SessionError> {
        if self.is_terminated() {
            return Err(SessionError::OracleUnavailable("game is over".to_string()));
        }
        let fen = self.game.to_fen();
        let timeout = self.oracle_timeout;
        let oracle = self.oracle.as_mut().ok_or_else(|| {
            SessionError::OracleUnavailable(OracleError::Unavailable.to_string())
        })?;

        let suggestion = oracle
            .best_move(&fen, timeout)
            .await
            .map_err(|e| SessionError::OracleUnavailable(e.to_string()))?;

        let token = format_uci_move(suggestion);
        let mv = self.game.resolve(&token).map_err(|_| {
            SessionError::OracleUnavailable(OracleError::IllegalSuggestion(token).to_string())
        })?;
        Ok(chess::uci::format_move(self.game.position(), mv))
    }

    /// The automated player is due to move.
    pub fn oracle_to_move(&self) -> bool {
        !self.is_terminated() && self.oracle.is_some() && self.game.side_to_move() == ORACLE_SIDE
    }

    /// Let the automated player reply, if it is its turn.
    ///
    /// On any oracle failure the session is left waiting for that side.
    pub async fn play_oracle_turn(&mut self) -> Option<String> {
        if !self.oracle_to_move() {
            return None;
        }

        let token = match self.query_oracle_move().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Oracle did not move: {}", e);
                return None;
            }
        };
        match self.apply_move(&token) {
            Ok(applied) => Some(applied),
            Err(e) => {
                tracing::warn!("Oracle move rejected: {}", e);
                None
            }
        }
    }

    /// Record the new tier and push it to the oracle. Returns whether the
    /// oracle accepted it; the tier is kept either way.
    pub async fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        tracing::info!(from = %self.difficulty, to = %difficulty, "Difficulty changed");
        self.difficulty = difficulty;

        let Some(oracle) = self.oracle.as_mut() else {
            return false;
        };
        match oracle.configure(difficulty.search_params()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Oracle rejected {} settings: {}", difficulty, e);
                false
            }
        }
    }

    /// Release the oracle process once the game is decided.
    pub async fn shutdown_oracle_if_ended(&mut self) {
        if self.is_terminated() {
            self.shutdown_oracle().await;
        }
    }

    pub async fn shutdown_oracle(&mut self) {
        if let Some(mut oracle) = self.oracle.take() {
            tracing::debug!("Shutting down oracle");
            oracle.shutdown().await;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let move_history: Vec<String> = self
            .game
            .history()
            .iter()
            .map(|entry| entry.token.clone())
            .collect();

        SessionSnapshot {
            fen: self.game.to_fen(),
            turn: self.game.side_to_move(),
            legal_moves: self.game.legal_move_tokens(),
            move_count: move_history.len(),
            last_move: move_history.last().cloned(),
            move_history,
            game_over: self.is_terminated(),
            result: self.outcome.map(|o| o.result),
            termination: self.outcome.map(|o| o.termination),
            in_check: self.game.is_check(),
            difficulty: self.difficulty,
        }
    }
}
