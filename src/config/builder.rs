//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile, StationConfig};
use crate::error::ConfigError;

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file, or from the default locations
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default()?,
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with CLI seed
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        if let Some(s) = seed {
            self.config.general.seed = Some(s);
        }
        self
    }

    /// Restrict to the given stations.
    ///
    /// Stations known to the file keep their overrides; unknown ones are
    /// added without overrides.
    pub fn with_stations(mut self, ids: &[String]) -> Self {
        if ids.is_empty() {
            return self;
        }

        let stations = ids
            .iter()
            .map(|id| {
                self.config
                    .stations
                    .iter()
                    .find(|s| &s.id == id)
                    .cloned()
                    .unwrap_or_else(|| StationConfig::new(id.as_str()))
            })
            .collect();
        self.config.stations = stations;
        self
    }

    /// Override with CLI sensor failure probability
    pub fn with_failure_probability(mut self, probability: Option<f64>) -> Self {
        if let Some(p) = probability {
            self.config.sensor.failure_probability = p;
        }
        self
    }

    /// Override with CLI extreme conditions probability
    pub fn with_extreme_probability(mut self, probability: Option<f64>) -> Self {
        if let Some(p) = probability {
            self.config.sensor.extreme_probability = p;
        }
        self
    }

    /// Build and validate the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
