//! Alert system domain types
//!
//! Defines the alert kinds, the sub-conditions an alert can carry and the
//! immutable alert record handed to handlers.

use crate::domain::SensorReading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert kinds, ordered by priority (lowest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// One or more readings beyond the extreme thresholds
    ExtremeConditions,
    /// The sensor itself failed; preempts everything else
    SensorFailure,
}

impl AlertKind {
    /// All kinds, highest priority first
    pub const ALL: [AlertKind; 2] = [Self::SensorFailure, Self::ExtremeConditions];

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SensorFailure => "sensor_failure",
            Self::ExtremeConditions => "extreme_conditions",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorFailure => write!(f, "SENSOR FAILURE"),
            Self::ExtremeConditions => write!(f, "EXTREME CONDITIONS"),
        }
    }
}

/// A single sub-condition that fired during evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "condition", content = "value", rename_all = "snake_case")]
pub enum Condition {
    /// Water level at or above the extreme-tide threshold
    ExtremeTide(f64),
    /// Water level at or above the high-tide threshold, below extreme
    HighTide(f64),
    /// Temperature at or below the minimum
    ExtremeLowTemperature(f64),
    /// Temperature at or above the maximum
    ExtremeHighTemperature(f64),
    /// Wind speed at or above the maximum
    ExtremeWind(f64),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExtremeTide(v) => write!(f, "extreme tide: {:.2} m", v),
            Self::HighTide(v) => write!(f, "high tide: {:.2} m", v),
            Self::ExtremeLowTemperature(v) => write!(f, "extreme low temperature: {:.1}°C", v),
            Self::ExtremeHighTemperature(v) => write!(f, "extreme high temperature: {:.1}°C", v),
            Self::ExtremeWind(v) => write!(f, "extreme wind: {:.1} km/h", v),
        }
    }
}

/// Separator between condition labels in an alert message
pub const CONDITION_SEPARATOR: &str = " | ";

/// An alert raised by one station for one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert kind
    pub kind: AlertKind,
    /// Station that raised it
    pub station_id: String,
    /// Timestamp of the triggering reading
    pub timestamp: DateTime<Utc>,
    /// Human-readable summary
    pub message: String,
    /// Sub-conditions, in tide, temperature, wind order (empty for failures)
    pub conditions: Vec<Condition>,
    /// The reading that caused it
    pub reading: SensorReading,
}

impl Alert {
    /// Build a sensor failure alert
    pub fn sensor_failure(station_id: &str, reading: SensorReading) -> Self {
        Self {
            kind: AlertKind::SensorFailure,
            station_id: station_id.to_string(),
            timestamp: reading.timestamp,
            message: format!("sensor failure: {}", reading.health),
            conditions: Vec::new(),
            reading,
        }
    }

    /// Build an extreme conditions alert from the conditions that fired
    pub fn extreme_conditions(
        station_id: &str,
        reading: SensorReading,
        conditions: Vec<Condition>,
    ) -> Self {
        let message = conditions
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(CONDITION_SEPARATOR);

        Self {
            kind: AlertKind::ExtremeConditions,
            station_id: station_id.to_string(),
            timestamp: reading.timestamp,
            message,
            conditions,
            reading,
        }
    }

    /// Check whether a given condition variant fired, ignoring its value
    pub fn has_condition(&self, predicate: fn(&Condition) -> bool) -> bool {
        self.conditions.iter().any(predicate)
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.station_id, self.kind, self.message)
    }
}
