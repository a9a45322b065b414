use cozy_chess::{Board, Piece, Rank, Square};

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    if fen.split_whitespace().next().is_none() {
        return Err(FenError::Empty);
    }

    fen.parse()
        .map_err(|_| FenError::InvalidFormat(fen.to_string()))
}

/// Format a Board as a FEN string.
///
/// The en passant square is only written when a legal en passant capture
/// exists, so a double pawn push with no capturing pawn beside it reads `-`.
pub fn format_fen(board: &Board) -> String {
    let fen = board.to_string();
    if board.en_passant().is_none() || en_passant_target(board).is_some() {
        return fen;
    }
    fen.split(' ')
        .enumerate()
        .map(|(i, field)| if i == 3 { "-" } else { field })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The en passant target square, if the side to move can actually capture there.
pub fn en_passant_target(board: &Board) -> Option<Square> {
    let file = board.en_passant()?;
    let target = Square::new(file, Rank::Sixth.relative_to(board.side_to_move()));
    let mut capturable = false;
    board.generate_moves(|mvs| {
        capturable = mvs.piece == Piece::Pawn && mvs.to.has(target);
        capturable
    });
    capturable.then_some(target)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Empty FEN")]
    Empty,
    #[error("Invalid FEN: {0}")]
    InvalidFormat(String),
}
