//! Move-token notation.
//!
//! Tokens are UCI coordinate moves (`e2e4`, `e7e8q`). cozy-chess encodes
//! castling as king-takes-own-rook (`e1h1`); every token this crate hands out
//! uses the king's two-square move (`e1g1`) instead.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

/// Parse UCI move format (e2e4, e7e8q)
pub fn parse_uci_move(s: &str) -> Result<Move, NotationError> {
    if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
        return Err(NotationError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = match s.get(4..5) {
        None => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return Err(NotationError::InvalidPromotion(s.to_string())),
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

pub fn parse_square(s: &str) -> Result<Square, NotationError> {
    let &[file, rank] = s.as_bytes() else {
        return Err(NotationError::InvalidSquare(s.to_string()));
    };

    let file = match file {
        b'a' => File::A,
        b'b' => File::B,
        b'c' => File::C,
        b'd' => File::D,
        b'e' => File::E,
        b'f' => File::F,
        b'g' => File::G,
        b'h' => File::H,
        _ => return Err(NotationError::InvalidSquare(s.to_string())),
    };

    let rank = match rank {
        b'1' => Rank::First,
        b'2' => Rank::Second,
        b'3' => Rank::Third,
        b'4' => Rank::Fourth,
        b'5' => Rank::Fifth,
        b'6' => Rank::Sixth,
        b'7' => Rank::Seventh,
        b'8' => Rank::Eighth,
        _ => return Err(NotationError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

pub fn format_square(sq: Square) -> String {
    let file = match sq.file() {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    };
    let rank = match sq.rank() {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    };
    format!("{}{}", file, rank)
}

fn promotion_char(piece: Piece) -> char {
    match piece {
        Piece::Queen => 'q',
        Piece::Rook => 'r',
        Piece::Bishop => 'b',
        Piece::Knight => 'n',
        Piece::Pawn => 'p',
        Piece::King => 'k',
    }
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q").
///
/// The move is written as-is; use [`format_move`] for moves taken from
/// cozy-chess move generation.
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(promotion_char(promo));
    }
    s
}

/// Format a legal move of `board` as a token, castling in two-square form.
pub fn format_move(board: &Board, mv: Move) -> String {
    format_uci_move(to_standard_castling(board, mv))
}

/// Rewrite a cozy-chess castling move (`e1h1`) as the king's two-square move (`e1g1`).
pub fn to_standard_castling(board: &Board, mv: Move) -> Move {
    let is_castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to).is_some()
        && board.color_on(mv.to) == board.color_on(mv.from);
    if !is_castle {
        return mv;
    }

    let file = if (mv.to.file() as usize) > (mv.from.file() as usize) {
        File::G
    } else {
        File::C
    };
    Move {
        from: mv.from,
        to: Square::new(file, mv.from.rank()),
        promotion: None,
    }
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// The converted move is only returned if it appears in `legal_moves`, so a
/// plain king move from e1 to g1 is never mistaken for a castle.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    let same_rank = mv.from.rank() == mv.to.rank();

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && same_rank && mv.promotion.is_none() {
        let rook_file = match mv.to.file() {
            File::G => File::H,
            _ => File::A,
        };

        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legal_moves(board: &Board) -> Vec<Move> {
        let mut moves = Vec::new();
        board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    #[test]
    fn test_format_uci_move() {
        let mv = Move {
            from: Square::new(File::E, Rank::Second),
            to: Square::new(File::E, Rank::Fourth),
            promotion: None,
        };
        assert_eq!(format_uci_move(mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let mv = Move {
            from: Square::new(File::E, Rank::Seventh),
            to: Square::new(File::E, Rank::Eighth),
            promotion: Some(Piece::Queen),
        };
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_parse_roundtrips_promotion() {
        let mv = parse_uci_move("a7a8n").unwrap();
        assert_eq!(mv.promotion, Some(Piece::Knight));
        assert_eq!(format_uci_move(mv), "a7a8n");
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for token in ["", "e2", "e2e", "e2e4qq", "i2e4", "e9e4", "e7e8k", "E2E4", "e2e4 ", "é2e4"] {
            assert!(parse_uci_move(token).is_err(), "accepted {:?}", token);
        }
    }

    #[test]
    fn test_castling_converts_both_ways() {
        // White can castle kingside after 1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5
        let board: Board = "r1bqk1nr/pppp1ppp/2n5/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4"
            .parse()
            .unwrap();
        let legal = legal_moves(&board);

        let uci = parse_uci_move("e1g1").unwrap();
        let cozy = convert_uci_castling_to_cozy(uci, &legal);
        assert_eq!(format_uci_move(cozy), "e1h1");
        assert!(legal.contains(&cozy));

        assert_eq!(format_move(&board, cozy), "e1g1");
    }

    #[test]
    fn test_non_castling_king_move_untouched() {
        let board: Board = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let legal = legal_moves(&board);
        let mv = parse_uci_move("e1f1").unwrap();
        assert_eq!(convert_uci_castling_to_cozy(mv, &legal), mv);
        assert_eq!(format_move(&board, mv), "e1f1");
    }
}
