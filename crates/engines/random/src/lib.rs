//! Random Move Source
//!
//! A player that picks uniformly at random among all legal moves.
//! Useful for:
//! - Simulating large batches of games cheaply
//! - Baseline comparisons (any real engine should easily beat this)
//! - Stress testing move generation and outcome detection

use chess_core::{Game, Move, MoveSource, MoveSourceError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;


/// A player that plays random legal moves.
///
/// The legal moves are shuffled and the first one is played. The generator
/// is the only state kept between calls.
#[derive(Debug, Clone)]
pub struct RandomMoveSource {
    rng: StdRng,
}

impl Default for RandomMoveSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomMoveSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible move choices
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl MoveSource for RandomMoveSource {
    fn choose_move(&mut self, game: &Game) -> Result<Move, MoveSourceError> {
        let mut moves = game.legal_moves();
        moves.shuffle(&mut self.rng);
        moves.first().copied().ok_or(MoveSourceError::NoLegalMoves)
    }

    fn name(&self) -> &str {
        "Random"
    }
}
