//! Creating the move sources that play a contest

use chess_core::{MoveSource, MoveSourceError};
use random_engine::RandomMoveSource;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use uci_engine::UciEngine;

use crate::config::Config;
use crate::contest::PlayerKind;

/// Creates one move source per player slot per contest.
///
/// Sources are created inside the worker task that plays the contest and
/// dropped when that task ends, so anything they own (an engine process)
/// lives exactly as long as the contest.
pub trait PlayerFactory: Sync {
    fn create(&self, kind: PlayerKind) -> Result<Box<dyn MoveSource>, MoveSourceError>;
}

/// Random players and the configured UCI engine
#[derive(Debug, Clone)]
pub struct StandardPlayers {
    engine_path: Option<PathBuf>,
    move_time: Duration,
}

impl StandardPlayers {
    pub fn new(engine_path: Option<PathBuf>, move_time: Duration) -> Self {
        Self {
            engine_path,
            move_time,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.engine_path.clone(), config.move_time())
    }
}

impl PlayerFactory for StandardPlayers {
    fn create(&self, kind: PlayerKind) -> Result<Box<dyn MoveSource>, MoveSourceError> {
        match kind {
            PlayerKind::Random => Ok(Box::new(RandomMoveSource::new())),
            PlayerKind::Engine => {
                let path = self.engine_path.as_deref().ok_or_else(|| MoveSourceError::Spawn {
                    path: "<unset>".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no engine path configured"),
                })?;
                Ok(Box::new(UciEngine::spawn(path, self.move_time)?))
            }
        }
    }
}
