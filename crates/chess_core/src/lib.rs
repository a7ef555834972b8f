pub mod game;
pub mod san;
pub mod uci;

// Re-export the board collaborator and the pieces of cozy-chess callers need
pub use cozy_chess::{Board, Color, Move, Piece, Square};
pub use game::*;
pub use san::*;
pub use uci::*;

use thiserror::Error;

// =============================================================================
// MoveSource trait: implemented by every player (random, external engine)
// =============================================================================

/// Errors a move source can raise while choosing a move.
///
/// Any of these ends the contest that asked for the move; sibling contests
/// are unaffected.
#[derive(Debug, Error)]
pub enum MoveSourceError {
    #[error("no legal move is available")]
    NoLegalMoves,
    #[error("failed to start engine {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine process exited unexpectedly")]
    EngineExited,
    #[error("engine protocol error: {0}")]
    Protocol(String),
    #[error("engine suggested illegal move {0}")]
    IllegalMove(String),
    #[error("engine did not answer within {0:?}")]
    Timeout(std::time::Duration),
}

/// Trait that all players must implement.
///
/// A move source is asked for exactly one legal move for the side to move
/// in `game`. Implementations may hold external resources (an engine
/// process); those are released when the source is dropped.
pub trait MoveSource: Send {
    /// Choose a legal move for the side to move.
    fn choose_move(&mut self, game: &Game) -> Result<Move, MoveSourceError>;

    /// Returns the player's display name
    fn name(&self) -> &str;
}
