//! tidewatch - tide-gauge monitoring tool
//!
//! Runs simulated monitoring stations and reports sensor failures and
//! extreme conditions as they happen.

use clap::Parser;
use tidewatch::cli::args::{generate_completions, Cli, Commands};
use tidewatch::commands::{run_config, run_evaluate, run_monitor};
use tidewatch::error::{AppError, ConfigError, StationError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let config = cli.config.as_deref();

    match &cli.command {
        Commands::Run(args) => run_monitor(args, cli.format, config, cli.seed),

        Commands::Config { raw } => run_config(cli.format, *raw, config, cli.seed),

        Commands::Evaluate(args) => run_evaluate(args, cli.format, config, cli.seed),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Check the --config path or the TIDEWATCH_CONFIG variable.");
        }
        AppError::Config(ConfigError::TomlError(_)) => {
            eprintln!();
            eprintln!("Hint: Known sections are [general], [thresholds], [sensor] and [[stations]].");
        }
        AppError::Station(StationError::UnknownStation(_)) => {
            eprintln!();
            eprintln!("Hint: Run 'tidewatch config' to list the configured stations.");
        }
        _ => {}
    }
}
