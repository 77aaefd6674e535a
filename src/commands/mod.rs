//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod config;
pub mod evaluate;
pub mod run;

pub use config::run_config;
pub use evaluate::run_evaluate;
pub use run::run_monitor;

use crate::config::ConfigBuilder;
use crate::error::ConfigError;

/// Load the configuration file and apply global CLI overrides
pub(crate) fn load_config(path: Option<&str>, seed: Option<u64>) -> Result<ConfigBuilder, ConfigError> {
    Ok(ConfigBuilder::new().with_file(path)?.with_seed(seed))
}
