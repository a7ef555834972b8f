//! Contest records
//!
//! A `ContestRecord` tracks one simulated game: who plays in which slot,
//! the moves played so far and, once the game is over, how it ended.

use chess_core::Termination;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of player taking part in a contest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerKind {
    Random,
    Engine,
}

impl PlayerKind {
    pub fn label(self) -> &'static str {
        match self {
            PlayerKind::Random => "Random",
            PlayerKind::Engine => "Engine",
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(PlayerKind::Random),
            "engine" => Ok(PlayerKind::Engine),
            _ => Err(format!("unknown player kind {s:?}")),
        }
    }
}

/// Player slot within a contest. Slot 0 moves first (White).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Slot> {
        match index {
            0 => Some(Slot::First),
            1 => Some(Slot::Second),
            _ => None,
        }
    }

    pub fn color_name(self) -> &'static str {
        match self {
            Slot::First => "White",
            Slot::Second => "Black",
        }
    }
}

/// Identity of a contest within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContestId {
    pub sequence: u32,
    pub players: [PlayerKind; 2],
}

impl fmt::Display for ContestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Game_{}_{}_{}",
            self.sequence, self.players[0], self.players[1]
        )
    }
}

/// How a finished contest ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContestOutcome {
    pub termination: Termination,
    /// None for a draw
    pub winner: Option<Slot>,
}

impl ContestOutcome {
    /// PGN result token
    pub fn result_token(&self) -> &'static str {
        match self.winner {
            Some(Slot::First) => "1-0",
            Some(Slot::Second) => "0-1",
            None => "1/2-1/2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestState {
    /// No move played yet
    New,
    InProgress,
    /// Outcome recorded; never resumed
    Terminal,
}

/// One simulated game
#[derive(Debug, Clone)]
pub struct ContestRecord {
    id: ContestId,
    /// SAN of every half-move, in order
    moves: Vec<String>,
    turn: Slot,
    outcome: Option<ContestOutcome>,
    /// Why the contest's task failed, if it did
    failure: Option<String>,
}

impl ContestRecord {
    pub fn new(sequence: u32, players: [PlayerKind; 2]) -> Self {
        Self {
            id: ContestId { sequence, players },
            moves: Vec::new(),
            turn: Slot::First,
            outcome: None,
            failure: None,
        }
    }

    /// A fresh record with the same sequence number and the players'
    /// slots exchanged
    pub fn swapped(&self) -> Self {
        let [first, second] = self.id.players;
        Self::new(self.id.sequence, [second, first])
    }

    pub fn id(&self) -> ContestId {
        self.id
    }

    pub fn sequence(&self) -> u32 {
        self.id.sequence
    }

    pub fn players(&self) -> [PlayerKind; 2] {
        self.id.players
    }

    pub fn player(&self, slot: Slot) -> PlayerKind {
        self.id.players[slot.index()]
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn half_moves(&self) -> usize {
        self.moves.len()
    }

    /// Slot whose move it is
    pub fn turn(&self) -> Slot {
        self.turn
    }

    pub fn outcome(&self) -> Option<&ContestOutcome> {
        self.outcome.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn state(&self) -> ContestState {
        if self.outcome.is_some() {
            ContestState::Terminal
        } else if self.moves.is_empty() {
            ContestState::New
        } else {
            ContestState::InProgress
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state() == ContestState::Terminal
    }

    /// Append a half-move in SAN.
    ///
    /// # Panics
    /// If the contest is already terminal.
    pub fn add_move(&mut self, notation: impl Into<String>) {
        assert!(
            !self.is_terminal(),
            "{}: move recorded after the game ended",
            self.id
        );
        self.moves.push(notation.into());
    }

    /// Pass the move to the other slot; once per recorded move.
    pub fn advance_turn(&mut self) {
        self.turn = self.turn.other();
    }

    /// Record the final result.
    ///
    /// # Panics
    /// If an outcome was already recorded.
    pub fn finalize(&mut self, termination: Termination, winner: Option<Slot>) {
        assert!(
            self.outcome.is_none(),
            "{}: outcome recorded twice",
            self.id
        );
        self.outcome = Some(ContestOutcome {
            termination,
            winner,
        });
    }

    /// Remember why the contest could not be finished. The outcome stays
    /// unset.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.failure = Some(reason.into());
    }

    /// PGN result token; `*` while no outcome is known
    pub fn result_token(&self) -> &'static str {
        self.outcome.map_or("*", |o| o.result_token())
    }

    /// Numbered move lines: two half-moves per line, a lone half-move on
    /// the last line when the count is odd
    pub fn move_lines(&self) -> Vec<String> {
        self.moves
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect()
    }

    /// PGN transcript of the contest
    pub fn transcript(&self, date: NaiveDate) -> String {
        let mut pgn = vec![
            "[Event \"Simulation\"]".to_string(),
            "[Site \"?\"]".to_string(),
            format!("[Date \"{}\"]", date.format("%Y.%m.%d")),
            format!("[Round \"{}\"]", self.id.sequence),
            format!("[White \"{}\"]", self.id.players[0]),
            format!("[Black \"{}\"]", self.id.players[1]),
            format!("[Result \"{}\"]", self.result_token()),
            String::new(),
        ];
        pgn.extend(self.move_lines());

        let mut text = pgn.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
#[path = "contest_tests.rs"]
mod contest_tests;
