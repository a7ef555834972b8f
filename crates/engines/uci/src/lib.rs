//! External UCI engine as a move source
//!
//! Each `UciEngine` owns one engine process. The process is started by
//! `spawn`, asked for one move per `choose_move` call, and shut down exactly
//! once: either by an explicit `shutdown` or when the value is dropped, so
//! a game that ends in an error still releases its engine.

use chess_core::{parse_uci_move, position_command, Game, Move, MoveSource, MoveSourceError};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Default thinking time per move
pub const DEFAULT_MOVE_TIME: Duration = Duration::from_millis(100);

/// Time allowed for the `uci` / `isready` handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time on top of the move time before an engine counts as stuck
pub const REPLY_GRACE: Duration = Duration::from_secs(5);

/// Time the engine gets to exit after `quit` before it is killed
const QUIT_GRACE: Duration = Duration::from_millis(500);

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    /// Lines read from the engine's stdout by a reader thread
    lines: Receiver<String>,
}

/// A running UCI engine
pub struct UciEngine {
    name: String,
    move_time: Duration,
    reply_grace: Duration,
    process: Option<EngineProcess>,
}

impl UciEngine {
    /// Start the engine executable at `path` and complete the UCI handshake.
    pub fn spawn(path: &Path, move_time: Duration) -> Result<Self, MoveSourceError> {
        Self::from_command(Command::new(path), move_time)
    }

    /// Start an engine from a prepared command (extra arguments, wrapper
    /// interpreters) and complete the UCI handshake.
    pub fn from_command(mut command: Command, move_time: Duration) -> Result<Self, MoveSourceError> {
        let program = command.get_program().to_string_lossy().into_owned();
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| MoveSourceError::Spawn {
                path: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(MoveSourceError::EngineExited)?;
        let stdout = child.stdout.take().ok_or(MoveSourceError::EngineExited)?;

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut engine = Self {
            name: program,
            move_time,
            reply_grace: REPLY_GRACE,
            process: Some(EngineProcess {
                child,
                stdin,
                lines: rx,
            }),
        };
        // On failure the engine is dropped here, which reaps the process
        engine.handshake()?;
        tracing::debug!(engine = %engine.name, "engine ready");
        Ok(engine)
    }

    fn handshake(&mut self) -> Result<(), MoveSourceError> {
        self.send("uci")?;
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        loop {
            let line = self.read_line(deadline, HANDSHAKE_TIMEOUT)?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = name.trim().to_string();
            } else if line.trim() == "uciok" {
                break;
            }
        }

        self.send("ucinewgame")?;
        self.sync(HANDSHAKE_TIMEOUT)
    }

    /// `isready` round trip
    fn sync(&mut self, timeout: Duration) -> Result<(), MoveSourceError> {
        self.send("isready")?;
        let deadline = Instant::now() + timeout;
        while self.read_line(deadline, timeout)?.trim() != "readyok" {}
        Ok(())
    }

    fn send(&mut self, command: &str) -> Result<(), MoveSourceError> {
        let process = self.process.as_mut().ok_or(MoveSourceError::EngineExited)?;
        tracing::trace!(engine = %self.name, "> {command}");
        writeln!(process.stdin, "{command}")?;
        process.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self, deadline: Instant, budget: Duration) -> Result<String, MoveSourceError> {
        let process = self.process.as_mut().ok_or(MoveSourceError::EngineExited)?;
        let remaining = deadline.saturating_duration_since(Instant::now());
        match process.lines.recv_timeout(remaining) {
            Ok(line) => {
                tracing::trace!(engine = %self.name, "< {line}");
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => Err(MoveSourceError::Timeout(budget)),
            Err(RecvTimeoutError::Disconnected) => Err(MoveSourceError::EngineExited),
        }
    }

    pub fn move_time(&self) -> Duration {
        self.move_time
    }

    /// Replace the time allowed on top of the move time for a `bestmove`
    /// reply
    pub fn with_reply_grace(mut self, grace: Duration) -> Self {
        self.reply_grace = grace;
        self
    }

    /// OS process id of the engine while it runs
    pub fn process_id(&self) -> Option<u32> {
        self.process.as_ref().map(|p| p.child.id())
    }

    /// Whether the engine process has not been shut down yet
    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    /// Stop the engine process. Safe to call more than once; only the
    /// first call does anything.
    pub fn shutdown(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };

        // The engine may already be gone; quitting is best effort
        let _ = writeln!(process.stdin, "quit");
        let _ = process.stdin.flush();
        drop(process.stdin);

        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match process.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!(engine = %self.name, %status, "engine exited");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => break,
            }
        }

        tracing::warn!(engine = %self.name, "engine ignored quit, killing it");
        let _ = process.child.kill();
        let _ = process.child.wait();
    }
}

impl MoveSource for UciEngine {
    fn choose_move(&mut self, game: &Game) -> Result<Move, MoveSourceError> {
        self.send(&position_command(game))?;
        self.send(&format!("go movetime {}", self.move_time.as_millis()))?;

        let budget = self.move_time + self.reply_grace;
        let deadline = Instant::now() + budget;
        loop {
            let line = self.read_line(deadline, budget)?;
            let mut tokens = line.split_whitespace();
            if tokens.next() != Some("bestmove") {
                continue;
            }

            let reply = tokens
                .next()
                .ok_or_else(|| MoveSourceError::Protocol(format!("empty bestmove line {line:?}")))?;
            return parse_uci_move(game.board(), reply)
                .ok_or_else(|| MoveSourceError::IllegalMove(reply.to_string()));
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
