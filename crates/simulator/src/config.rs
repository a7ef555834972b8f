//! Simulation configuration
//!
//! Raw values come from the config file and the command line, loosely
//! typed. `RawConfig::merge` applies command-line precedence and
//! `Config::validate` turns the result into an immutable `Config` or the
//! first field that is wrong.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use toml::Value;

use crate::contest::PlayerKind;

/// Config file read when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_SIMULATIONS: u32 = 100;
pub const DEFAULT_THREADS: usize = 1;
pub const DEFAULT_OUTPUT_DIR: &str = "out";
pub const DEFAULT_MOVE_TIME_MS: u64 = 100;

/// Why a configuration was rejected, in validation order
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("simulations must be an integer >= 0, got {0}")]
    InvalidCount(String),
    #[error("threads must be an integer >= 1, got {0}")]
    InvalidWorkerCount(String),
    #[error("opponent must be 'Random' or 'Engine', got {0}")]
    InvalidOpponent(String),
    #[error("engine path {} does not exist", .0.as_ref().map_or("<unset>".into(), |p| p.display().to_string()))]
    MissingEngine(Option<PathBuf>),
    #[error("output directory {} does not exist", .0.display())]
    MissingOutputDir(PathBuf),
    #[error("move_time_ms must be an integer >= 1, got {0}")]
    InvalidMoveTime(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Unvalidated configuration values.
///
/// Every field is optional and untyped so that a wrong type is reported
/// as a validation error for that field rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawConfig {
    pub verbosity: Option<Value>,
    pub simulations: Option<Value>,
    pub opponent: Option<Value>,
    pub engine: Option<Value>,
    pub threads: Option<Value>,
    pub output: Option<Value>,
    pub move_time_ms: Option<Value>,
}

impl RawConfig {
    /// Load a config file that must exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Load a config file if it exists, otherwise start from defaults
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlay `overrides` on top of `self`: a value present in
    /// `overrides` wins.
    pub fn merge(self, overrides: RawConfig) -> RawConfig {
        RawConfig {
            verbosity: overrides.verbosity.or(self.verbosity),
            simulations: overrides.simulations.or(self.simulations),
            opponent: overrides.opponent.or(self.opponent),
            engine: overrides.engine.or(self.engine),
            threads: overrides.threads.or(self.threads),
            output: overrides.output.or(self.output),
            move_time_ms: overrides.move_time_ms.or(self.move_time_ms),
        }
    }
}

/// Validated simulation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Print each game's outcome as it finishes
    pub verbosity: bool,
    /// Number of games to simulate
    pub contest_count: u32,
    /// Who plays against the random player
    pub opponent: PlayerKind,
    /// Engine executable, set iff the opponent is the engine
    pub engine_path: Option<PathBuf>,
    /// Games played in parallel
    pub worker_count: usize,
    /// Existing directory that receives the run directory
    pub output_dir: PathBuf,
    /// Engine thinking time per move
    pub move_time_ms: u64,
}

impl Config {
    /// Check every field in order and build the configuration.
    ///
    /// Pure apart from checking that paths exist; nothing is created.
    pub fn validate(raw: &RawConfig) -> Result<Config, ValidationError> {
        let contest_count = match &raw.simulations {
            None => DEFAULT_SIMULATIONS,
            Some(v) => integer(v)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| ValidationError::InvalidCount(describe(v)))?,
        };

        let worker_count = match &raw.threads {
            None => DEFAULT_THREADS,
            Some(v) => integer(v)
                .and_then(|n| usize::try_from(n).ok())
                .filter(|&n| n >= 1)
                .ok_or_else(|| ValidationError::InvalidWorkerCount(describe(v)))?,
        };

        let opponent = match present(&raw.opponent) {
            None => PlayerKind::Random,
            Some(v) => text(v)
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| ValidationError::InvalidOpponent(describe(v)))?,
        };

        let engine_path = match opponent {
            PlayerKind::Random => None,
            PlayerKind::Engine => {
                let path = present(&raw.engine).and_then(text).map(PathBuf::from);
                match path {
                    Some(path) if path.exists() => Some(path),
                    other => return Err(ValidationError::MissingEngine(other)),
                }
            }
        };

        let output_dir = match present(&raw.output) {
            None => PathBuf::from(DEFAULT_OUTPUT_DIR),
            Some(v) => match text(v) {
                Some(s) => PathBuf::from(s),
                None => {
                    return Err(ValidationError::MissingOutputDir(PathBuf::from(describe(v))))
                }
            },
        };
        if !output_dir.is_dir() {
            return Err(ValidationError::MissingOutputDir(output_dir));
        }

        let move_time_ms = match &raw.move_time_ms {
            None => DEFAULT_MOVE_TIME_MS,
            Some(v) => integer(v)
                .and_then(|n| u64::try_from(n).ok())
                .filter(|&n| n >= 1)
                .ok_or_else(|| ValidationError::InvalidMoveTime(describe(v)))?,
        };

        let verbosity = match &raw.verbosity {
            Some(Value::Boolean(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        Ok(Config {
            verbosity,
            contest_count,
            opponent,
            engine_path,
            worker_count,
            output_dir,
            move_time_ms,
        })
    }

    pub fn move_time(&self) -> Duration {
        Duration::from_millis(self.move_time_ms)
    }
}

/// Integers, or strings holding one (command-line values arrive as text)
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An empty string counts as unset
fn present(value: &Option<Value>) -> Option<&Value> {
    value
        .as_ref()
        .filter(|v| !matches!(v, Value::String(s) if s.trim().is_empty()))
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
