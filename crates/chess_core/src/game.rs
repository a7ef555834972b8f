//! Game state tracking on top of the cozy-chess board
//!
//! `Game` owns the current position plus everything cozy-chess does not
//! track itself: the repetition history, an unbounded half-move clock and
//! the move list in UCI form for engines.

use cozy_chess::{Board, Color, Move, Piece, Square};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::uci::move_to_uci;

/// Half-moves without capture or pawn move that end the game
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of one position that end the game
pub const FIVEFOLD_REPETITION: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid FEN {0:?}")]
    InvalidFen(String),
    #[error("illegal move {0}")]
    IllegalMove(String),
    #[error("game is already over")]
    GameOver,
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

impl Termination {
    pub const ALL: [Termination; 5] = [
        Termination::Checkmate,
        Termination::Stalemate,
        Termination::InsufficientMaterial,
        Termination::SeventyFiveMoves,
        Termination::FivefoldRepetition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::InsufficientMaterial => "insufficient_material",
            Termination::SeventyFiveMoves => "seventyfive_moves",
            Termination::FivefoldRepetition => "fivefold_repetition",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Termination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Termination::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown termination {s:?}"))
    }
}

/// Final result reported by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub termination: Termination,
    /// None for a draw
    pub winner: Option<Color>,
}

/// A chess game in progress
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    /// FEN the game started from (None = standard start position)
    start_fen: Option<String>,
    /// Repetition key after every ply, including the start position
    position_history: Vec<u64>,
    /// Half-moves since the last capture or pawn move
    halfmove_clock: u32,
    /// Moves played so far, in UCI notation
    uci_moves: Vec<String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Game from the standard starting position
    pub fn new() -> Self {
        Self::from_board(Board::default(), None)
    }

    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let board: Board = fen
            .parse()
            .map_err(|_| GameError::InvalidFen(fen.to_string()))?;
        Ok(Self::from_board(board, Some(fen.to_string())))
    }

    fn from_board(board: Board, start_fen: Option<String>) -> Self {
        let halfmove_clock = board.halfmove_clock() as u32;
        let hash = repetition_key(&board);
        Self {
            board,
            start_fen,
            position_history: vec![hash],
            halfmove_clock,
            uci_moves: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub fn uci_moves(&self) -> &[String] {
        &self.uci_moves
    }

    pub fn ply_count(&self) -> usize {
        self.uci_moves.len()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.board)
    }

    /// Apply a legal move.
    pub fn play(&mut self, mv: Move) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if !self.legal_moves().contains(&mv) {
            return Err(GameError::IllegalMove(mv.to_string()));
        }

        let irreversible = self.board.piece_on(mv.from) == Some(Piece::Pawn)
            || self.board.color_on(mv.to) == Some(opponent(self.side_to_move()));
        let uci = move_to_uci(&self.board, mv);

        self.board.play_unchecked(mv);
        self.halfmove_clock = if irreversible {
            0
        } else {
            self.halfmove_clock + 1
        };
        self.position_history.push(repetition_key(&self.board));
        self.uci_moves.push(uci);
        Ok(())
    }

    /// How often the current position has occurred, current one included
    pub fn repetition_count(&self) -> usize {
        let current = repetition_key(&self.board);
        self.position_history
            .iter()
            .filter(|&&h| h == current)
            .count()
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// The game result, once the position is over.
    ///
    /// Checked in order: checkmate, insufficient material, stalemate,
    /// seventy-five-move rule, fivefold repetition.
    pub fn outcome(&self) -> Option<Outcome> {
        let no_moves = self.legal_moves().is_empty();
        if no_moves && self.in_check() {
            return Some(Outcome {
                termination: Termination::Checkmate,
                winner: Some(opponent(self.side_to_move())),
            });
        }

        let termination = if is_insufficient_material(&self.board) {
            Termination::InsufficientMaterial
        } else if no_moves {
            Termination::Stalemate
        } else if self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
            Termination::SeventyFiveMoves
        } else if self.repetition_count() >= FIVEFOLD_REPETITION {
            Termination::FivefoldRepetition
        } else {
            return None;
        };

        Some(Outcome {
            termination,
            winner: None,
        })
    }
}

/// Hash identifying a position for repetition purposes.
///
/// An en passant square only distinguishes positions while an en passant
/// capture is actually legal.
pub fn repetition_key(board: &Board) -> u64 {
    if board.en_passant().is_none() || has_en_passant_capture(board) {
        return board.hash();
    }

    let fen = board.to_string();
    let mut fields: Vec<&str> = fen.split_whitespace().collect();
    if let Some(ep) = fields.get_mut(3) {
        *ep = "-";
    }
    fields
        .join(" ")
        .parse::<Board>()
        .map_or_else(|_| board.hash(), |stripped| stripped.hash())
}

fn has_en_passant_capture(board: &Board) -> bool {
    legal_moves(board).into_iter().any(|mv| {
        board.piece_on(mv.from) == Some(Piece::Pawn)
            && mv.from.file() != mv.to.file()
            && board.piece_on(mv.to).is_none()
    })
}

/// All legal moves in the position
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}

pub fn opponent(color: Color) -> Color {
    match color {
        Color::White => Color::Black,
        Color::Black => Color::White,
    }
}

/// Neither side can possibly deliver mate: bare kings, a single minor
/// piece, or bishops that all stand on one square colour.
pub fn is_insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() {
        return false;
    }

    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    if knights.len() + bishops.len() <= 1 {
        return true;
    }
    if !knights.is_empty() {
        return false;
    }

    let light = bishops.into_iter().filter(|&sq| is_light_square(sq)).count();
    light == 0 || light == bishops.len() as usize
}

pub fn is_light_square(sq: Square) -> bool {
    (sq.file() as usize + sq.rank() as usize) % 2 == 1
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
