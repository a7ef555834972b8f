//! Batch chess simulator
//!
//! This crate provides:
//! - Validation of the simulation configuration (file + command line)
//! - Contest records tracking one game each
//! - An orchestrator playing a roster of contests on a worker pool
//! - Persisting a finished run as PGN transcripts and summaries
//! - Reading a persisted run back for aggregate statistics
//!
//! # Usage
//!
//! ```bash
//! # 100 games of random vs random, 4 at a time
//! cargo run -p simulator -- --simulations 100 --threads 4
//!
//! # Random vs a UCI engine, printing each result
//! cargo run -p simulator -- --opponent engine --engine /usr/bin/stockfish --verbosity
//!
//! # Statistics for a finished run
//! cargo run -p simulator -- analyze out/2024-03-09-14:05:07
//! ```

mod analysis;
mod config;
mod contest;
mod orchestrator;
mod players;
mod results;

pub use analysis::*;
pub use config::*;
pub use contest::*;
pub use orchestrator::*;
pub use players::*;
pub use results::*;
