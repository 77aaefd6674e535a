//! Evaluate command implementation
//!
//! Classifies one reading given on the command line, without starting any
//! station.

use crate::alerts::{evaluate, EventBus};
use crate::cli::args::{EvaluateArgs, OutputFormat};
use crate::cli::output::{print_output, EvaluationOutput};
use crate::commands::load_config;
use crate::domain::{SensorHealth, SensorReading};
use crate::error::{Result, StationError};

use std::sync::Arc;

/// Execute the evaluate command
pub fn run_evaluate(
    args: &EvaluateArgs,
    format: OutputFormat,
    config_path: Option<&str>,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path, seed)?.build()?;
    let manager = config.build_manager(Arc::new(EventBus::new()))?;

    let station = match &args.station {
        Some(id) => manager
            .station(id)
            .ok_or_else(|| StationError::UnknownStation(id.clone()))?,
        None => manager
            .stations()
            .first()
            .ok_or_else(|| StationError::UnknownStation(String::new()))?,
    };

    let reading = build_reading(args);
    let alert = evaluate(station.id(), &reading, &station.configuration());

    let output = EvaluationOutput {
        station: station.id().to_string(),
        reading,
        alert,
    };
    print_output(&output, format)?;
    Ok(())
}

fn build_reading(args: &EvaluateArgs) -> SensorReading {
    match SensorHealth::from(args.health) {
        SensorHealth::Functioning => {
            SensorReading::functioning(args.water_level, args.temperature, args.wind, args.pressure)
        }
        failed => SensorReading::failed(failed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::HealthArg;

    fn args(water_level: f64, health: HealthArg) -> EvaluateArgs {
        EvaluateArgs {
            station: None,
            water_level,
            temperature: 15.0,
            wind: 0.0,
            pressure: 1013.0,
            health,
        }
    }

    #[test]
    fn test_build_functioning_reading() {
        let reading = build_reading(&args(3.2, HealthArg::Functioning));
        assert_eq!(reading.health, SensorHealth::Functioning);
        assert_eq!(reading.water_level_m, 3.2);
    }

    #[test]
    fn test_failed_reading_ignores_values() {
        let reading = build_reading(&args(9.0, HealthArg::Disconnected));
        assert_eq!(reading.health, SensorHealth::Disconnected);
        assert_eq!(reading.water_level_m, 0.0);
    }
}
