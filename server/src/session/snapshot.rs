use chess::{GameResult, Side, Termination};
use serde::Serialize;

use super::difficulty::Difficulty;

/// Complete, immutable snapshot of session state, as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub fen: String,
    pub turn: Side,
    /// Empty once the game is over
    pub legal_moves: Vec<String>,
    pub move_history: Vec<String>,
    pub game_over: bool,
    pub result: Option<GameResult>,
    pub termination: Option<Termination>,
    pub in_check: bool,
    pub move_count: usize,
    pub last_move: Option<String>,
    pub difficulty: Difficulty,
}
