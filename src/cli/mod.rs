//! Command-line interface
//!
//! Argument definitions (clap derive) and table/JSON/compact rendering of
//! station summaries, configurations and evaluations.

pub mod args;
pub mod output;

pub use args::{Cli, Commands, OutputFormat};
