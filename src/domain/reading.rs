//! Sensor reading domain types
//!
//! A reading is one sample of the gauge: water level, weather and the
//! health of the sensor at the time it was taken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of the sensor when a reading was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorHealth {
    /// Sensor answered normally
    Functioning,
    /// Sensor answered but the value could not be read
    ReadFailure,
    /// Sensor did not answer
    Disconnected,
}

impl SensorHealth {
    /// Check if the sensor produced usable values
    pub fn is_functioning(&self) -> bool {
        matches!(self, Self::Functioning)
    }

    /// Stable lowercase name used in messages and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functioning => "functioning",
            Self::ReadFailure => "read_failure",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for SensorHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sample from a tide gauge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Water level in meters
    pub water_level_m: f64,
    /// Air temperature in Celsius
    pub temperature_c: f64,
    /// Wind speed in km/h
    pub wind_speed_kmh: f64,
    /// Barometric pressure in hPa
    pub pressure_hpa: f64,
    /// Sensor health
    pub health: SensorHealth,
    /// When the sample was taken
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    /// Create a reading from a functioning sensor, taken now
    pub fn functioning(
        water_level_m: f64,
        temperature_c: f64,
        wind_speed_kmh: f64,
        pressure_hpa: f64,
    ) -> Self {
        Self {
            water_level_m,
            temperature_c,
            wind_speed_kmh,
            pressure_hpa,
            health: SensorHealth::Functioning,
            timestamp: Utc::now(),
        }
    }

    /// Create a failed reading; numeric fields are zeroed
    pub fn failed(health: SensorHealth) -> Self {
        Self {
            water_level_m: 0.0,
            temperature_c: 0.0,
            wind_speed_kmh: 0.0,
            pressure_hpa: 0.0,
            health,
            timestamp: Utc::now(),
        }
    }

    /// Builder: set the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.health.is_functioning() {
            return write!(f, "sensor {}", self.health);
        }
        write!(
            f,
            "level {:.2} m | temp {:.1}°C | wind {:.1} km/h | pressure {:.1} hPa",
            self.water_level_m, self.temperature_c, self.wind_speed_kmh, self.pressure_hpa
        )
    }
}

/// Round a value to a fixed number of decimals
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
