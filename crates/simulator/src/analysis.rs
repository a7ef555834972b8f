//! Aggregate statistics over a persisted run
//!
//! Reads back the directories written by `ResultWriter` and replays every
//! transcript on a fresh board to count which pieces moved and how.

use chess_core::{classify_move, parse_san, piece_letter, Game, Piece, Termination};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::contest::Slot;
use crate::results::{Summary, SUMMARY_FILE, TRANSCRIPT_FILE};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed summary {}: {reason}", .path.display())]
    Summary { path: PathBuf, reason: String },
    #[error("malformed transcript {}: {reason}", .path.display())]
    Transcript { path: PathBuf, reason: String },
}

/// Counts of moves with a special property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialMoves {
    /// Moves played by a side that was in check
    pub checks: usize,
    pub castles: usize,
    pub en_passants: usize,
    pub promotions: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub contests: usize,
    pub terminations: HashMap<Termination, usize>,
    pub first_mover_wins: usize,
    pub second_mover_wins: usize,
    pub draws: usize,
    /// Contests that never reached a terminal position
    pub incomplete: usize,
    pub min_moves: Option<usize>,
    pub max_moves: Option<usize>,
    pub total_moves: usize,
    /// Indexed by `Piece as usize`
    pub piece_moves: [usize; 6],
    pub special: SpecialMoves,
}

impl RunStatistics {
    pub fn mean_moves(&self) -> Option<f64> {
        (self.contests > 0).then(|| self.total_moves as f64 / self.contests as f64)
    }

    pub fn termination_count(&self, termination: Termination) -> usize {
        self.terminations.get(&termination).copied().unwrap_or(0)
    }

    pub fn piece_count(&self, piece: Piece) -> usize {
        self.piece_moves[piece as usize]
    }

    fn add_summary(&mut self, summary: &Summary) {
        self.contests += 1;
        match (summary.termination, summary.winner) {
            (None, _) => self.incomplete += 1,
            (Some(_), Some(Slot::First)) => self.first_mover_wins += 1,
            (Some(_), Some(Slot::Second)) => self.second_mover_wins += 1,
            (Some(_), None) => self.draws += 1,
        }
        if let Some(termination) = summary.termination {
            *self.terminations.entry(termination).or_default() += 1;
        }

        self.total_moves += summary.moves;
        self.min_moves = Some(self.min_moves.map_or(summary.moves, |m| m.min(summary.moves)));
        self.max_moves = Some(self.max_moves.map_or(summary.moves, |m| m.max(summary.moves)));
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contests: {}", self.contests)?;

        writeln!(f, "Terminations:")?;
        for termination in Termination::ALL {
            writeln!(f, "  {termination}: {}", self.termination_count(termination))?;
        }

        writeln!(f, "Winners:")?;
        writeln!(f, "  first mover: {}", self.first_mover_wins)?;
        writeln!(f, "  second mover: {}", self.second_mover_wins)?;
        writeln!(f, "  draw: {}", self.draws)?;
        writeln!(f, "  incomplete: {}", self.incomplete)?;

        match (self.min_moves, self.max_moves, self.mean_moves()) {
            (Some(min), Some(max), Some(mean)) => {
                writeln!(f, "Half-moves: min {min}, max {max}, mean {mean:.1}")?
            }
            _ => writeln!(f, "Half-moves: none")?,
        }

        writeln!(f, "Piece moves:")?;
        for piece in Piece::ALL {
            writeln!(f, "  {}: {}", piece_letter(piece), self.piece_count(piece))?;
        }

        writeln!(f, "Special moves:")?;
        writeln!(f, "  from check: {}", self.special.checks)?;
        writeln!(f, "  castle: {}", self.special.castles)?;
        writeln!(f, "  en passant: {}", self.special.en_passants)?;
        writeln!(f, "  promotion: {}", self.special.promotions)
    }
}

/// Collect statistics for every contest directory under `run_dir`.
pub fn analyze_run(run_dir: &Path) -> Result<RunStatistics, AnalysisError> {
    let mut contest_dirs = Vec::new();
    for entry in fs::read_dir(run_dir).map_err(io_error(run_dir))? {
        let entry = entry.map_err(io_error(run_dir))?;
        if entry.file_type().map_err(io_error(&entry.path()))?.is_dir() {
            contest_dirs.push(entry.path());
        }
    }
    contest_dirs.sort();

    let mut stats = RunStatistics::default();
    for dir in &contest_dirs {
        let summary_path = dir.join(SUMMARY_FILE);
        let text = fs::read_to_string(&summary_path).map_err(io_error(&summary_path))?;
        let summary: Summary = text.parse().map_err(|reason| AnalysisError::Summary {
            path: summary_path.clone(),
            reason,
        })?;

        let transcript_path = dir.join(TRANSCRIPT_FILE);
        let pgn = fs::read_to_string(&transcript_path).map_err(io_error(&transcript_path))?;
        let replayed = replay_transcript(&pgn, &mut stats).map_err(|reason| {
            AnalysisError::Transcript {
                path: transcript_path.clone(),
                reason,
            }
        })?;
        if replayed != summary.moves {
            return Err(AnalysisError::Transcript {
                path: transcript_path,
                reason: format!(
                    "{replayed} moves in transcript, summary says {}",
                    summary.moves
                ),
            });
        }

        stats.add_summary(&summary);
    }

    tracing::debug!(run_dir = %run_dir.display(), contests = stats.contests, "run analyzed");
    Ok(stats)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> AnalysisError {
    let path = path.to_path_buf();
    move |source| AnalysisError::Io { path, source }
}

/// Replay the move text of a transcript, adding piece and special move
/// counts to `stats`. Returns the number of half-moves replayed.
fn replay_transcript(pgn: &str, stats: &mut RunStatistics) -> Result<usize, String> {
    let mut game = Game::new();
    let mut played = 0;

    let tokens = pgn
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('['))
        .flat_map(str::split_whitespace)
        .filter(|tok| !tok.ends_with('.'))
        .filter(|tok| !matches!(*tok, "1-0" | "0-1" | "1/2-1/2" | "*"));

    for san in tokens {
        let mv = parse_san(game.board(), san)
            .ok_or_else(|| format!("move {} ({san}) is not legal", played + 1))?;
        let traits = classify_move(game.board(), mv)
            .ok_or_else(|| format!("move {} ({san}) has no piece", played + 1))?;

        stats.piece_moves[traits.piece as usize] += 1;
        stats.special.checks += usize::from(game.in_check());
        stats.special.castles += usize::from(traits.castle);
        stats.special.en_passants += usize::from(traits.en_passant);
        stats.special.promotions += usize::from(traits.promotion.is_some());

        game.play(mv).map_err(|err| err.to_string())?;
        played += 1;
    }
    Ok(played)
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod analysis_tests;
