//! Threshold configuration for a station
//!
//! Holds the numeric boundaries used to classify readings and the bounds of
//! the randomized interval between two readings. Updates arrive as loose
//! `key = value` pairs and are validated key by key.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest accepted reading interval bound, in seconds (one day)
pub const MAX_READING_INTERVAL: f64 = 86_400.0;

/// Name of a single field of [`ThresholdConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    HighTideThreshold,
    ExtremeTideThreshold,
    ExtremeTempMin,
    ExtremeTempMax,
    ExtremeWindMax,
    MinReadingInterval,
    MaxReadingInterval,
}

impl ConfigKey {
    /// All keys, in display order
    pub const ALL: [ConfigKey; 7] = [
        Self::HighTideThreshold,
        Self::ExtremeTideThreshold,
        Self::ExtremeTempMin,
        Self::ExtremeTempMax,
        Self::ExtremeWindMax,
        Self::MinReadingInterval,
        Self::MaxReadingInterval,
    ];

    /// Key as it appears in configuration files and update requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighTideThreshold => "high_tide_threshold",
            Self::ExtremeTideThreshold => "extreme_tide_threshold",
            Self::ExtremeTempMin => "extreme_temp_min",
            Self::ExtremeTempMax => "extreme_temp_max",
            Self::ExtremeWindMax => "extreme_wind_max",
            Self::MinReadingInterval => "min_reading_interval",
            Self::MaxReadingInterval => "max_reading_interval",
        }
    }

    /// Unit of the value, for display
    pub fn unit(&self) -> &'static str {
        match self {
            Self::HighTideThreshold | Self::ExtremeTideThreshold => "m",
            Self::ExtremeTempMin | Self::ExtremeTempMax => "°C",
            Self::ExtremeWindMax => "km/h",
            Self::MinReadingInterval | Self::MaxReadingInterval => "s",
        }
    }

    fn is_interval(&self) -> bool {
        matches!(self, Self::MinReadingInterval | Self::MaxReadingInterval)
    }

    /// Validate a value for this key in isolation
    fn check(&self, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: self.as_str().to_string(),
                message: format!("{} is not a finite number", value),
            });
        }
        if self.is_interval() && value < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: self.as_str().to_string(),
                message: format!("interval cannot be negative ({})", value),
            });
        }
        if self.is_interval() && value > MAX_READING_INTERVAL {
            return Err(ConfigError::InvalidValue {
                key: self.as_str().to_string(),
                message: format!(
                    "interval cannot exceed {} s ({})",
                    MAX_READING_INTERVAL, value
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidKey(s.to_string()))
    }
}

/// Per-station classification thresholds and sampling interval bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Water level (m) at or above which a high tide is reported
    pub high_tide_threshold: f64,
    /// Water level (m) at or above which an extreme tide is reported
    pub extreme_tide_threshold: f64,
    /// Temperature (°C) at or below which it is extreme
    pub extreme_temp_min: f64,
    /// Temperature (°C) at or above which it is extreme
    pub extreme_temp_max: f64,
    /// Wind speed (km/h) at or above which it is extreme
    pub extreme_wind_max: f64,
    /// Shortest wait between readings, in seconds
    pub min_reading_interval: f64,
    /// Longest wait between readings, in seconds
    pub max_reading_interval: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_tide_threshold: 2.5,
            extreme_tide_threshold: 4.0,
            extreme_temp_min: -5.0,
            extreme_temp_max: 35.0,
            extreme_wind_max: 120.0,
            min_reading_interval: 0.5,
            max_reading_interval: 3.0,
        }
    }
}

impl ThresholdConfig {
    /// Read one field
    pub fn get(&self, key: ConfigKey) -> f64 {
        match key {
            ConfigKey::HighTideThreshold => self.high_tide_threshold,
            ConfigKey::ExtremeTideThreshold => self.extreme_tide_threshold,
            ConfigKey::ExtremeTempMin => self.extreme_temp_min,
            ConfigKey::ExtremeTempMax => self.extreme_temp_max,
            ConfigKey::ExtremeWindMax => self.extreme_wind_max,
            ConfigKey::MinReadingInterval => self.min_reading_interval,
            ConfigKey::MaxReadingInterval => self.max_reading_interval,
        }
    }

    fn set(&mut self, key: ConfigKey, value: f64) {
        let slot = match key {
            ConfigKey::HighTideThreshold => &mut self.high_tide_threshold,
            ConfigKey::ExtremeTideThreshold => &mut self.extreme_tide_threshold,
            ConfigKey::ExtremeTempMin => &mut self.extreme_temp_min,
            ConfigKey::ExtremeTempMax => &mut self.extreme_temp_max,
            ConfigKey::ExtremeWindMax => &mut self.extreme_wind_max,
            ConfigKey::MinReadingInterval => &mut self.min_reading_interval,
            ConfigKey::MaxReadingInterval => &mut self.max_reading_interval,
        };
        *slot = value;
    }

    /// All fields with their keys, in display order
    pub fn entries(&self) -> Vec<(ConfigKey, f64)> {
        ConfigKey::ALL.iter().map(|&k| (k, self.get(k))).collect()
    }

    /// Check every invariant of the record
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in self.entries() {
            key.check(value)?;
        }
        if self.min_reading_interval > self.max_reading_interval {
            return Err(inverted_interval(ConfigKey::MinReadingInterval));
        }
        Ok(())
    }

    /// Apply a batch of `key = value` updates.
    ///
    /// Every key is validated on its own: unknown keys and bad values are
    /// reported in the returned [`UpdateReport`] while the remaining keys are
    /// applied. If the interval bounds end up inverted, the interval keys of
    /// this batch are rejected and the previous bounds kept.
    pub fn apply_updates<K: AsRef<str>>(&mut self, updates: &[(K, f64)]) -> UpdateReport {
        let mut candidate = *self;
        let mut report = UpdateReport::default();

        for (name, value) in updates {
            let key = match name.as_ref().parse::<ConfigKey>() {
                Ok(key) => key,
                Err(e) => {
                    report.rejected.push(e);
                    continue;
                }
            };
            if let Err(e) = key.check(*value) {
                report.rejected.push(e);
                continue;
            }
            candidate.set(key, *value);
            if !report.applied.contains(&key) {
                report.applied.push(key);
            }
        }

        if candidate.min_reading_interval > candidate.max_reading_interval {
            candidate.min_reading_interval = self.min_reading_interval;
            candidate.max_reading_interval = self.max_reading_interval;
            for key in [ConfigKey::MinReadingInterval, ConfigKey::MaxReadingInterval] {
                if report.applied.contains(&key) {
                    report.applied.retain(|k| *k != key);
                    report.rejected.push(inverted_interval(key));
                }
            }
        }

        *self = candidate;
        report
    }
}

fn inverted_interval(key: ConfigKey) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.as_str().to_string(),
        message: "min_reading_interval must not exceed max_reading_interval".to_string(),
    }
}

/// Outcome of [`ThresholdConfig::apply_updates`]
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Keys that were applied
    pub applied: Vec<ConfigKey>,
    /// Per-key rejections
    pub rejected: Vec<ConfigError>,
}

impl UpdateReport {
    /// True when every supplied key was applied
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// Names of the rejected keys
    pub fn rejected_keys(&self) -> Vec<&str> {
        self.rejected
            .iter()
            .filter_map(|e| match e {
                ConfigError::InvalidKey(key) => Some(key.as_str()),
                ConfigError::InvalidValue { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }
}
