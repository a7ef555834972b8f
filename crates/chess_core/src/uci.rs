use cozy_chess::{Board, Move, Piece};

use crate::game::{legal_moves, Game};
use crate::san::{file_char, rank_char, square_name};

/// Format a move the way UCI engines expect it.
///
/// Castling is sent as the king's two-square step (`e1g1`) rather than
/// cozy-chess's king-takes-rook encoding.
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    let mut s = String::new();
    s.push_str(&square_name(mv.from));

    let castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move());
    if castle {
        let file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
            'g'
        } else {
            'c'
        };
        s.push(file);
        s.push(rank_char(mv.from));
    } else {
        s.push(file_char(mv.to));
        s.push(rank_char(mv.to));
    }

    if let Some(p) = mv.promotion {
        let ch = match p {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            _ => 'q',
        };
        s.push(ch);
    }
    s
}

pub fn parse_uci_move(board: &Board, txt: &str) -> Option<Move> {
    // Match against legal moves so castling is translated back correctly.
    let txt = txt.trim().to_ascii_lowercase();
    if txt.len() < 4 {
        return None;
    }
    legal_moves(board)
        .into_iter()
        .find(|&mv| move_to_uci(board, mv) == txt)
}

/// The `position` command describing the game so far
pub fn position_command(game: &Game) -> String {
    let mut cmd = match game.start_fen() {
        Some(fen) => format!("position fen {fen}"),
        None => "position startpos".to_string(),
    };
    if !game.uci_moves().is_empty() {
        cmd.push_str(" moves ");
        cmd.push_str(&game.uci_moves().join(" "));
    }
    cmd
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
