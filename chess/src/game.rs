use cozy_chess::{Board, Move, Piece};
use std::collections::HashMap;

use crate::fen::{self, FenError};
use crate::outcome::{self, Outcome};
use crate::types::Side;
use crate::uci::{self, NotationError};

/// Main game state wrapper around cozy-chess Board
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    /// Occurrences of each position since the start position, keyed by `repetition_key`
    repetitions: HashMap<u64, usize>,
    halfmove_clock: u16,
}

/// A move that has been applied to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    /// Canonical move token (two-square castling)
    pub token: String,
    pub side: Side,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        Ok(Self::from_board(fen::parse_fen(fen)?))
    }

    fn from_board(board: Board) -> Self {
        let mut repetitions = HashMap::new();
        repetitions.insert(repetition_key(&board), 1);
        Self {
            halfmove_clock: u16::from(board.halfmove_clock()),
            position: board,
            history: Vec::new(),
            repetitions,
        }
    }

    /// Rebuild a game by replaying `tokens` from the standard starting position.
    pub fn replay<S: AsRef<str>>(tokens: &[S]) -> Result<Self, GameError> {
        let mut game = Self::new();
        for token in tokens {
            game.play(token.as_ref())?;
        }
        Ok(game)
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Resolve a move token against the current position.
    ///
    /// Accepts both two-square (`e1g1`) and king-takes-rook (`e1h1`)
    /// castling. Fails if the token is malformed or the move is illegal.
    pub fn resolve(&self, token: &str) -> Result<Move, GameError> {
        let parsed = uci::parse_uci_move(token)?;
        let legal = self.legal_moves();
        let mv = uci::convert_uci_castling_to_cozy(parsed, &legal);
        if legal.contains(&mv) {
            Ok(mv)
        } else {
            Err(GameError::IllegalMove(token.to_string()))
        }
    }

    /// Play a move given as a token.
    ///
    /// The game is left untouched on any error.
    pub fn play(&mut self, token: &str) -> Result<&HistoryEntry, GameError> {
        if self.outcome().is_some() {
            return Err(GameError::GameOver);
        }
        let mv = self.resolve(token)?;
        Ok(self.apply(mv))
    }

    /// Apply a move already known to be legal.
    fn apply(&mut self, mv: Move) -> &HistoryEntry {
        let side = Side::from(self.position.side_to_move());
        let token = uci::format_move(&self.position, mv);

        let is_pawn_move = self.position.piece_on(mv.from) == Some(Piece::Pawn);
        let is_capture = self.position.color_on(mv.to) == Some(!self.position.side_to_move());
        if is_pawn_move || is_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        self.position.play_unchecked(mv);
        *self
            .repetitions
            .entry(repetition_key(&self.position))
            .or_insert(0) += 1;

        self.history.push(HistoryEntry { mv, token, side });
        &self.history[self.history.len() - 1]
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// Legal moves as tokens; empty once the game is over.
    pub fn legal_move_tokens(&self) -> Vec<String> {
        if self.outcome().is_some() {
            return Vec::new();
        }
        self.legal_moves()
            .into_iter()
            .map(|mv| uci::format_move(&self.position, mv))
            .collect()
    }

    /// Terminal state of the current position, if any
    pub fn outcome(&self) -> Option<Outcome> {
        let repetitions = self
            .repetitions
            .get(&repetition_key(&self.position))
            .copied()
            .unwrap_or(1);
        outcome::evaluate(&self.position, repetitions, self.halfmove_clock)
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Side {
        Side::from(self.position.side_to_move())
    }

    pub fn is_check(&self) -> bool {
        !self.position.checkers().is_empty()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        fen::format_fen(&self.position)
    }
}

/// Position identity for repetition counting. The en passant file only
/// distinguishes positions when the capture is actually playable.
fn repetition_key(board: &Board) -> u64 {
    if fen::en_passant_target(board).is_some() {
        board.hash()
    } else {
        board.hash_without_ep()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    InvalidToken(#[from] NotationError),
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Game is over")]
    GameOver,
    #[error(transparent)]
    InvalidFen(#[from] FenError),
}
