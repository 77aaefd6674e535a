//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use crate::domain::SensorHealth;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Tide-gauge monitoring stations
///
/// Sample simulated tide gauges, classify readings against thresholds and
/// report sensor failures and extreme conditions.
#[derive(Parser, Debug)]
#[command(name = "tidewatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TIDEWATCH_CONFIG")]
    pub config: Option<String>,

    /// Seed for reproducible simulated readings
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitoring stations
    Run(RunArgs),

    /// Show the effective configuration of every station
    Config {
        /// Print the merged configuration as TOML instead
        #[arg(long)]
        raw: bool,
    },

    /// Classify a single reading against the configured thresholds
    Evaluate(EvaluateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Station to run (repeatable); defaults to the configured stations
    #[arg(short, long = "station", value_name = "ID")]
    pub stations: Vec<String>,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(short, long, value_name = "SECS")]
    pub duration: Option<u64>,

    /// Do not print alerts as they happen
    #[arg(short, long)]
    pub quiet: bool,

    /// Chance that a simulated reading is a sensor failure (0-1)
    #[arg(long, value_name = "P")]
    pub failure_probability: Option<f64>,

    /// Chance that a simulated reading is extreme (0-1)
    #[arg(long, value_name = "P")]
    pub extreme_probability: Option<f64>,
}

/// Arguments for the evaluate command
#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Station whose thresholds are used
    #[arg(short, long = "station", value_name = "ID")]
    pub station: Option<String>,

    /// Water level in meters
    #[arg(long, allow_negative_numbers = true, default_value = "0")]
    pub water_level: f64,

    /// Temperature in °C
    #[arg(long, allow_negative_numbers = true, default_value = "15")]
    pub temperature: f64,

    /// Wind speed in km/h
    #[arg(long, default_value = "0")]
    pub wind: f64,

    /// Pressure in hPa
    #[arg(long, default_value = "1013")]
    pub pressure: f64,

    /// Sensor health
    #[arg(long, value_enum, default_value = "functioning")]
    pub health: HealthArg,
}

/// Sensor health argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthArg {
    /// Sensor works
    Functioning,
    /// Sensor failed to read
    ReadFailure,
    /// Sensor is disconnected
    Disconnected,
}

impl From<HealthArg> for SensorHealth {
    fn from(arg: HealthArg) -> Self {
        match arg {
            HealthArg::Functioning => SensorHealth::Functioning,
            HealthArg::ReadFailure => SensorHealth::ReadFailure,
            HealthArg::Disconnected => SensorHealth::Disconnected,
        }
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
