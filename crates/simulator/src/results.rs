//! Persisting a finished run
//!
//! Layout:
//! ```text
//! <output>/<YYYY-MM-DD-HH:MM:SS>/run.json
//! <output>/<YYYY-MM-DD-HH:MM:SS>/<Game_seq_p0_p1>/game.pgn
//! <output>/<YYYY-MM-DD-HH:MM:SS>/<Game_seq_p0_p1>/summary.yaml
//! ```

use chess_core::Termination;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::config::Config;
use crate::contest::{ContestId, ContestRecord, PlayerKind, Slot};

/// Run directory name format
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";
pub const TRANSCRIPT_FILE: &str = "game.pgn";
pub const SUMMARY_FILE: &str = "summary.yaml";
pub const MANIFEST_FILE: &str = "run.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to create run directory {}: {source}", .path.display())]
    RunDirectory { path: PathBuf, source: io::Error },
    #[error("failed to write run manifest {}: {source}", .path.display())]
    Manifest { path: PathBuf, source: io::Error },
}

/// Outcome summary of one contest, as stored in `summary.yaml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// None when the contest never finished
    pub termination: Option<Termination>,
    pub winner: Option<Slot>,
    /// Half-moves played
    pub moves: usize,
}

impl Summary {
    pub fn of(record: &ContestRecord) -> Self {
        Self {
            termination: record.outcome().map(|o| o.termination),
            winner: record.outcome().and_then(|o| o.winner),
            moves: record.half_moves(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.termination {
            Some(t) => writeln!(f, "termination: {t}")?,
            None => writeln!(f, "termination: None")?,
        }
        match self.winner {
            Some(slot) => writeln!(f, "winner: {}", slot.index())?,
            None => writeln!(f, "winner: None")?,
        }
        writeln!(f, "moves: {}", self.moves)
    }
}

impl FromStr for Summary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut termination = None;
        let mut winner = None;
        let mut moves = None;

        for line in s.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| format!("expected `key: value`, got {line:?}"))?;
            let value = value.trim();
            match key.trim() {
                "termination" => {
                    termination = Some(match value {
                        "None" => None,
                        other => Some(other.parse()?),
                    })
                }
                "winner" => {
                    winner = Some(match value {
                        "None" => None,
                        other => {
                            let index: usize =
                                other.parse().map_err(|_| format!("bad winner {other:?}"))?;
                            Some(Slot::from_index(index).ok_or(format!("bad winner {other:?}"))?)
                        }
                    })
                }
                "moves" => {
                    moves = Some(value.parse().map_err(|_| format!("bad move count {value:?}"))?)
                }
                other => return Err(format!("unknown key {other:?}")),
            }
        }

        Ok(Summary {
            termination: termination.ok_or("missing termination")?,
            winner: winner.ok_or("missing winner")?,
            moves: moves.ok_or("missing moves")?,
        })
    }
}

/// Per-contest entry of the run manifest
#[derive(Debug, Serialize)]
struct ManifestEntry {
    id: String,
    players: [PlayerKind; 2],
    status: &'static str,
    termination: Option<Termination>,
    winner: Option<usize>,
    moves: usize,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunManifest<'a> {
    timestamp: String,
    config: &'a Config,
    contests: Vec<ManifestEntry>,
}

/// A contest whose files could not be written
#[derive(Debug)]
pub struct WriteFailure {
    pub contest: ContestId,
    pub error: io::Error,
}

/// What `write_run` produced
#[derive(Debug)]
pub struct RunReport {
    pub run_dir: PathBuf,
    pub written: usize,
    pub failed: Vec<WriteFailure>,
}

/// Writes a finished roster below the output directory
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn run_dir(&self, timestamp: NaiveDateTime) -> PathBuf {
        self.output_dir
            .join(timestamp.format(RUN_TIMESTAMP_FORMAT).to_string())
    }

    /// Write every contest of the roster into a new run directory.
    ///
    /// Failing to create the run directory aborts the whole write. A
    /// contest whose files cannot be written is reported and skipped; the
    /// remaining contests are still written.
    pub fn write_run(
        &self,
        timestamp: NaiveDateTime,
        config: &Config,
        roster: &[ContestRecord],
    ) -> Result<RunReport, PersistError> {
        let run_dir = self.run_dir(timestamp);
        fs::create_dir(&run_dir).map_err(|source| PersistError::RunDirectory {
            path: run_dir.clone(),
            source,
        })?;

        let mut report = RunReport {
            run_dir: run_dir.clone(),
            written: 0,
            failed: Vec::new(),
        };

        for record in roster {
            match write_contest(&run_dir, timestamp, record) {
                Ok(()) => report.written += 1,
                Err(error) => {
                    tracing::error!(contest = %record.id(), %error, "failed to write contest results");
                    report.failed.push(WriteFailure {
                        contest: record.id(),
                        error,
                    });
                }
            }
        }

        let manifest_path = run_dir.join(MANIFEST_FILE);
        write_manifest(&manifest_path, timestamp, config, roster).map_err(|source| {
            PersistError::Manifest {
                path: manifest_path.clone(),
                source,
            }
        })?;

        tracing::info!(
            run_dir = %run_dir.display(),
            written = report.written,
            failed = report.failed.len(),
            "results written"
        );
        Ok(report)
    }
}

fn write_contest(run_dir: &Path, timestamp: NaiveDateTime, record: &ContestRecord) -> io::Result<()> {
    let dir = run_dir.join(record.id().to_string());
    fs::create_dir(&dir)?;
    fs::write(dir.join(TRANSCRIPT_FILE), record.transcript(timestamp.date()))?;
    fs::write(dir.join(SUMMARY_FILE), Summary::of(record).to_string())?;
    Ok(())
}

fn write_manifest(
    path: &Path,
    timestamp: NaiveDateTime,
    config: &Config,
    roster: &[ContestRecord],
) -> io::Result<()> {
    let contests = roster
        .iter()
        .map(|record| {
            let summary = Summary::of(record);
            let status = if record.failure().is_some() {
                "failed"
            } else if record.is_terminal() {
                "complete"
            } else {
                "incomplete"
            };
            ManifestEntry {
                id: record.id().to_string(),
                players: record.players(),
                status,
                termination: summary.termination,
                winner: summary.winner.map(Slot::index),
                moves: summary.moves,
                error: record.failure().map(str::to_string),
            }
        })
        .collect();

    let manifest = RunManifest {
        timestamp: timestamp.format(RUN_TIMESTAMP_FORMAT).to_string(),
        config,
        contests,
    };

    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &manifest).map_err(io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod results_tests;
