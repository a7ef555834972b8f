//! Simulation orchestrator: roster, worker pool and per-contest isolation

use chess_core::{move_to_san, Color, Game, GameError, MoveSource, MoveSourceError};
use parking_lot::Mutex;
use rand::Rng;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::Config;
use crate::contest::{ContestRecord, PlayerKind, Slot};
use crate::players::PlayerFactory;

/// Why a single contest could not be finished
#[derive(Debug, Error)]
pub enum ContestError {
    #[error("could not start {player} player: {source}")]
    Setup {
        player: PlayerKind,
        #[source]
        source: MoveSourceError,
    },
    #[error("{player} player failed: {source}")]
    MoveSource {
        player: PlayerKind,
        #[source]
        source: MoveSourceError,
    },
    #[error("board rejected move: {0}")]
    Board(#[from] GameError),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Counts after the batch barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Build `count` contests pairing the random player with `opponent`.
///
/// Exactly `count / 2` distinct contests, chosen at random, have the
/// players' slots reversed so neither side always moves first.
pub fn build_roster<R: Rng + ?Sized>(
    count: u32,
    opponent: PlayerKind,
    rng: &mut R,
) -> Vec<ContestRecord> {
    let mut roster: Vec<ContestRecord> = (0..count)
        .map(|sequence| ContestRecord::new(sequence, [PlayerKind::Random, opponent]))
        .collect();

    let len = roster.len();
    for index in rand::seq::index::sample(rng, len, len / 2).into_iter() {
        roster[index] = roster[index].swapped();
    }
    roster
}

/// Play one contest to its end.
///
/// `sources` holds the move source for each slot. The record only ever
/// receives moves the board accepted.
pub fn play_contest(
    record: &mut ContestRecord,
    sources: &mut [Box<dyn MoveSource>; 2],
) -> Result<(), ContestError> {
    let mut game = Game::new();

    let outcome = loop {
        if let Some(outcome) = game.outcome() {
            break outcome;
        }

        let slot = record.turn();
        let mv = sources[slot.index()]
            .choose_move(&game)
            .map_err(|source| ContestError::MoveSource {
                player: record.player(slot),
                source,
            })?;

        let san = move_to_san(game.board(), mv);
        game.play(mv)?;
        record.add_move(san);
        record.advance_turn();
    };

    let winner = outcome.winner.map(|color| match color {
        Color::White => Slot::First,
        Color::Black => Slot::Second,
    });
    record.finalize(outcome.termination, winner);
    Ok(())
}

/// Runs a roster of contests on a fixed-size worker pool
pub struct Orchestrator<F> {
    config: Config,
    players: F,
    /// Keeps multi-line console reports from interleaving
    console: Mutex<()>,
}

impl<F: PlayerFactory> Orchestrator<F> {
    pub fn new(config: Config, players: F) -> Self {
        Self {
            config,
            players,
            console: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Roster for the configured contest count and opponent
    pub fn build_roster<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ContestRecord> {
        build_roster(self.config.contest_count, self.config.opponent, rng)
    }

    /// Play every contest in `roster` and return once all of them have
    /// finished or failed.
    ///
    /// Each contest runs in its own task with exclusive access to its
    /// roster slot. A failing contest is logged and marked failed; it never
    /// affects the others.
    pub fn run(&self, roster: &mut [ContestRecord]) -> Result<BatchReport, OrchestratorError> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count)
            .thread_name(|i| format!("contest-worker-{i}"))
            .build()?;

        tracing::info!(
            contests = roster.len(),
            workers = self.config.worker_count,
            opponent = %self.config.opponent,
            "starting simulation"
        );

        pool.install(|| {
            roster.par_iter_mut().for_each(|record| self.run_task(record));
        });

        let failed = roster.iter().filter(|r| r.failure().is_some()).count();
        let report = BatchReport {
            completed: roster.len() - failed,
            failed,
            elapsed: start.elapsed(),
        };
        tracing::info!(
            completed = report.completed,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "simulation finished"
        );
        Ok(report)
    }

    /// Task boundary: nothing a contest does escapes this function.
    fn run_task(&self, record: &mut ContestRecord) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.play(record)));

        let reason = match result {
            Ok(Ok(())) => {
                tracing::debug!(contest = %record.id(), moves = record.half_moves(), "contest finished");
                if self.config.verbosity {
                    self.report(record);
                }
                return;
            }
            Ok(Err(err)) => err.to_string(),
            Err(payload) => format!("contest task panicked: {}", panic_message(payload.as_ref())),
        };

        tracing::error!(contest = %record.id(), %reason, "contest failed");
        record.mark_failed(reason);
    }

    fn play(&self, record: &mut ContestRecord) -> Result<(), ContestError> {
        let [first, second] = record.players();
        let create = |player: PlayerKind| {
            self.players
                .create(player)
                .map_err(|source| ContestError::Setup { player, source })
        };
        // Dropped when this function returns, on every path
        let mut sources = [create(first)?, create(second)?];
        play_contest(record, &mut sources)
    }

    fn report(&self, record: &ContestRecord) {
        let Some(outcome) = record.outcome() else {
            return;
        };
        let winner = outcome.winner.map_or("None", |slot| slot.color_name());

        let _guard = self.console.lock();
        println!(
            "{} - {} (White) vs. {} (Black)",
            record.id(),
            record.player(Slot::First),
            record.player(Slot::Second)
        );
        println!("Outcome: {}", outcome.termination);
        println!("Winner: {winner}");
        println!();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
