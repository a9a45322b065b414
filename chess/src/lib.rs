//! Rules engine adapter for chessweb.
//!
//! Wraps cozy-chess with the pieces the session layer needs: a [`Game`]
//! with move history and repetition tracking, move-token notation, and
//! terminal-state evaluation.

pub mod fen;
pub mod game;
pub mod outcome;
pub mod types;
pub mod uci;

pub use game::{Game, GameError, HistoryEntry};
pub use outcome::{GameResult, Outcome, Termination};
pub use types::Side;
pub use uci::{convert_uci_castling_to_cozy, format_uci_move, parse_uci_move, NotationError};
