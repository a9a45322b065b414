//! Terminal-state evaluation.
//!
//! A game ends on checkmate, stalemate, insufficient material, the
//! seventy-five-move rule, or fivefold repetition. None of these require a
//! player to claim them.

use cozy_chess::{BitBoard, Board, Color, Piece, Square};
use serde::Serialize;

use crate::types::Side;

/// Plies without a capture or pawn move after which the game is drawn.
pub const SEVENTY_FIVE_MOVE_PLIES: u16 = 150;

/// Occurrences of the same position after which the game is drawn.
pub const FIVEFOLD: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameResult {
    #[serde(rename = "1-0")]
    WhiteWins,
    #[serde(rename = "0-1")]
    BlackWins,
    #[serde(rename = "1/2-1/2")]
    Draw,
}

impl GameResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
        }
    }

    fn win_for(side: Side) -> Self {
        match side {
            Side::White => Self::WhiteWins,
            Side::Black => Self::BlackWins,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub result: GameResult,
    pub termination: Termination,
}

impl Outcome {
    fn draw(termination: Termination) -> Self {
        Self {
            result: GameResult::Draw,
            termination,
        }
    }
}

/// Evaluate whether `board` is terminal.
///
/// `repetitions` is how often the current position has occurred in the game
/// (including now), `halfmove_clock` the plies since the last capture or
/// pawn move.
pub fn evaluate(board: &Board, repetitions: usize, halfmove_clock: u16) -> Option<Outcome> {
    let has_moves = board.generate_moves(|mvs| !mvs.is_empty());
    let in_check = !board.checkers().is_empty();

    if !has_moves && in_check {
        let winner = Side::from(board.side_to_move()).opponent();
        return Some(Outcome {
            result: GameResult::win_for(winner),
            termination: Termination::Checkmate,
        });
    }
    if is_insufficient_material(board) {
        return Some(Outcome::draw(Termination::InsufficientMaterial));
    }
    if !has_moves {
        return Some(Outcome::draw(Termination::Stalemate));
    }
    if halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
        return Some(Outcome::draw(Termination::SeventyFiveMoves));
    }
    if repetitions >= FIVEFOLD {
        return Some(Outcome::draw(Termination::FivefoldRepetition));
    }
    None
}

/// Neither side can possibly deliver mate.
pub fn is_insufficient_material(board: &Board) -> bool {
    has_insufficient_material(board, Color::White) && has_insufficient_material(board, Color::Black)
}

/// `color` cannot deliver mate by any sequence of legal moves.
pub fn has_insufficient_material(board: &Board, color: Color) -> bool {
    let ours = board.colors(color);
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !(ours & heavy).is_empty() {
        return false;
    }

    if !(ours & board.pieces(Piece::Knight)).is_empty() {
        // A lone knight (or two) can only mate if the opponent has pieces
        // that block its own king's escape.
        let blockers = board.colors(!color) & !board.pieces(Piece::King) & !board.pieces(Piece::Queen);
        return ours.len() <= 2 && blockers.is_empty();
    }

    if !(ours & board.pieces(Piece::Bishop)).is_empty() {
        let bishops = board.pieces(Piece::Bishop);
        let same_shade = all_on_shade(bishops, true) || all_on_shade(bishops, false);
        return same_shade
            && board.pieces(Piece::Pawn).is_empty()
            && board.pieces(Piece::Knight).is_empty();
    }

    true
}

fn all_on_shade(squares: BitBoard, light: bool) -> bool {
    squares.into_iter().all(|sq| is_light(sq) == light)
}

fn is_light(sq: Square) -> bool {
    (sq.file() as usize + sq.rank() as usize) % 2 == 1
}
