//! Config command implementation
//!
//! Shows the thresholds each station would run with once file defaults and
//! per-station overrides are merged, or the merged configuration as TOML.

use crate::alerts::EventBus;
use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, ConfigOutput, StationConfigView};
use crate::commands::load_config;
use crate::config::ConfigFile;
use crate::error::Result;

use std::sync::Arc;

/// Execute the config command
pub fn run_config(
    format: OutputFormat,
    raw: bool,
    config_path: Option<&str>,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path, seed)?.build()?;
    if raw {
        print!("{}", ConfigFile::to_toml(&config)?);
        return Ok(());
    }
    let manager = config.build_manager(Arc::new(EventBus::new()))?;

    let output = ConfigOutput {
        stations: manager
            .stations()
            .iter()
            .map(|station| StationConfigView {
                id: station.id().to_string(),
                thresholds: station.configuration(),
            })
            .collect(),
    };

    print_output(&output, format)?;
    Ok(())
}
