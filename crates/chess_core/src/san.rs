//! Standard Algebraic Notation
//!
//! cozy-chess encodes castling as the king capturing its own rook; this
//! module hides that encoding behind `O-O` / `O-O-O`.

use cozy_chess::{Board, Move, Piece, Square};

use crate::game::{legal_moves, opponent};

/// What kind of move a legal move is, as needed for notation and move
/// statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTraits {
    pub piece: Piece,
    pub capture: bool,
    pub castle: bool,
    pub en_passant: bool,
    pub promotion: Option<Piece>,
    /// The move gives check (or mate)
    pub check: bool,
    pub mate: bool,
}

/// Classify a move in the position it is played from.
///
/// Returns None when no piece stands on the origin square.
pub fn classify_move(board: &Board, mv: Move) -> Option<MoveTraits> {
    let piece = board.piece_on(mv.from)?;
    let us = board.side_to_move();

    let castle = piece == Piece::King && board.color_on(mv.to) == Some(us);
    let en_passant =
        piece == Piece::Pawn && mv.from.file() != mv.to.file() && board.piece_on(mv.to).is_none();
    let capture = en_passant || board.color_on(mv.to) == Some(opponent(us));

    let mut after = board.clone();
    after.play_unchecked(mv);
    let check = !after.checkers().is_empty();
    let mate = check && legal_moves(&after).is_empty();

    Some(MoveTraits {
        piece,
        capture,
        castle,
        en_passant,
        promotion: mv.promotion,
        check,
        mate,
    })
}

/// Format a legal move in SAN, including check and mate suffixes.
pub fn move_to_san(board: &Board, mv: Move) -> String {
    let Some(traits) = classify_move(board, mv) else {
        return mv.to_string();
    };

    let mut san = String::new();

    if traits.castle {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        if traits.piece != Piece::Pawn {
            san.push(piece_letter(traits.piece));
            san.push_str(&disambiguation(board, mv, traits.piece));
        }

        if traits.capture {
            if traits.piece == Piece::Pawn {
                san.push(file_char(mv.from));
            }
            san.push('x');
        }

        san.push_str(&square_name(mv.to));

        if let Some(promo) = traits.promotion {
            san.push('=');
            san.push(piece_letter(promo));
        }
    }

    if traits.mate {
        san.push('#');
    } else if traits.check {
        san.push('+');
    }
    san
}

/// Find the legal move whose SAN matches `text`.
///
/// Check/mate suffixes and annotation glyphs are ignored, and `0-0` is
/// accepted for `O-O`.
pub fn parse_san(board: &Board, text: &str) -> Option<Move> {
    let wanted = normalize_san(text);
    if wanted.is_empty() {
        return None;
    }
    legal_moves(board)
        .into_iter()
        .find(|&mv| normalize_san(&move_to_san(board, mv)) == wanted)
}

fn normalize_san(text: &str) -> String {
    text.trim()
        .trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
        .replace('0', "O")
}

/// Origin file and/or rank needed to tell `mv` apart from other moves of
/// the same piece kind to the same square.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to && other.from != mv.from && board.piece_on(other.from) == Some(piece)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let same_file = rivals.iter().any(|sq| sq.file() == mv.from.file());
    let same_rank = rivals.iter().any(|sq| sq.rank() == mv.from.rank());

    if !same_file {
        file_char(mv.from).to_string()
    } else if !same_rank {
        rank_char(mv.from).to_string()
    } else {
        square_name(mv.from)
    }
}

pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

pub fn file_char(sq: Square) -> char {
    (b'a' + sq.file() as u8) as char
}

pub fn rank_char(sq: Square) -> char {
    (b'1' + sq.rank() as u8) as char
}

pub fn square_name(sq: Square) -> String {
    format!("{}{}", file_char(sq), rank_char(sq))
}

#[cfg(test)]
#[path = "san_tests.rs"]
mod san_tests;
