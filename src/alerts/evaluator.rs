//! Condition evaluator
//!
//! Classifies a reading against a threshold snapshot. At most one alert is
//! produced per reading; a sensor failure preempts every other check.

use super::types::{Alert, Condition};
use crate::domain::{SensorReading, ThresholdConfig};

/// Evaluate a reading against a threshold snapshot.
///
/// Boundaries are inclusive toward the stricter label: a level equal to the
/// extreme-tide threshold is an extreme tide, never a high tide.
pub fn evaluate(
    station_id: &str,
    reading: &SensorReading,
    thresholds: &ThresholdConfig,
) -> Option<Alert> {
    if !reading.health.is_functioning() {
        return Some(Alert::sensor_failure(station_id, *reading));
    }

    let conditions = extreme_conditions(reading, thresholds);
    if conditions.is_empty() {
        return None;
    }

    Some(Alert::extreme_conditions(station_id, *reading, conditions))
}

/// Collect the sub-conditions a functioning reading trips, in tide,
/// temperature, wind order
pub fn extreme_conditions(reading: &SensorReading, thresholds: &ThresholdConfig) -> Vec<Condition> {
    let mut conditions = Vec::new();

    let level = reading.water_level_m;
    if level >= thresholds.extreme_tide_threshold {
        conditions.push(Condition::ExtremeTide(level));
    } else if level >= thresholds.high_tide_threshold {
        conditions.push(Condition::HighTide(level));
    }

    let temp = reading.temperature_c;
    if temp <= thresholds.extreme_temp_min {
        conditions.push(Condition::ExtremeLowTemperature(temp));
    } else if temp >= thresholds.extreme_temp_max {
        conditions.push(Condition::ExtremeHighTemperature(temp));
    }

    if reading.wind_speed_kmh >= thresholds.extreme_wind_max {
        conditions.push(Condition::ExtremeWind(reading.wind_speed_kmh));
    }

    conditions
}
