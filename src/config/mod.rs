//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::EventBus;
use crate::domain::ThresholdConfig;
use crate::error::{AppError, ConfigError};
use crate::sensor::SensorModel;
use crate::station::manager::simulated_sensors;
use crate::station::{StationManager, StationOptions};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Identifier of the station used when none is configured
pub const DEFAULT_STATION_ID: &str = "default";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Thresholds every station starts from
    pub thresholds: ThresholdConfig,
    /// Simulated sensor model
    pub sensor: SensorModel,
    /// Stations to monitor
    pub stations: Vec<StationConfig>,
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// How long stopping a station waits for its loop, in milliseconds
    pub shutdown_timeout_ms: u64,
    /// Wait after a failed cycle, in milliseconds
    pub error_backoff_ms: u64,
    /// Pause between two station starts, in milliseconds
    pub start_stagger_ms: u64,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_ms: 2000,
            error_backoff_ms: 1000,
            start_stagger_ms: 500,
            seed: None,
        }
    }
}

/// One configured station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Station identifier
    pub id: String,
    /// Threshold overrides, `key = value`
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

impl StationConfig {
    /// Station without overrides
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            overrides: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Check thresholds and sensor model
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        self.sensor
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "sensor".to_string(),
                message: e.to_string(),
            })?;

        for (i, station) in self.stations.iter().enumerate() {
            if station.id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("stations[{}].id", i),
                    message: "station id cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Configured stations, or the single default station
    pub fn effective_stations(&self) -> Vec<StationConfig> {
        if self.stations.is_empty() {
            vec![StationConfig::new(DEFAULT_STATION_ID)]
        } else {
            self.stations.clone()
        }
    }

    /// Timing options for every station
    pub fn station_options(&self) -> StationOptions {
        StationOptions {
            shutdown_timeout: Duration::from_millis(self.general.shutdown_timeout_ms),
            error_backoff: Duration::from_millis(self.general.error_backoff_ms),
            seed: self.general.seed,
        }
    }

    /// Build a manager with one simulated station per configured station
    pub fn build_manager(&self, bus: Arc<EventBus>) -> Result<StationManager, AppError> {
        self.validate()?;

        let mut manager = StationManager::new(bus)
            .with_sensor_factory(simulated_sensors(self.sensor.clone()))
            .with_defaults(self.thresholds)?
            .with_options(self.station_options())
            .with_start_stagger(Duration::from_millis(self.general.start_stagger_ms));

        for station in self.effective_stations() {
            let overrides: Vec<(&str, f64)> = station
                .overrides
                .iter()
                .map(|(key, value)| (key.as_str(), *value))
                .collect();
            manager.add_station(&station.id, &overrides)?;
        }

        Ok(manager)
    }
}
