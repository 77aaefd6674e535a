//! Simulated tide gauge
//!
//! Produces synthetic readings from a simple random model: a baseline water
//! level plus a tidal offset, occasional surges into extreme ranges, and
//! occasional sensor failures. Extreme temperatures are drawn beyond the
//! station's current temperature thresholds.

use super::traits::SensorSource;
use crate::domain::{round_to, SensorHealth, SensorReading, ThresholdConfig};
use crate::error::SensorError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Closed interval a value is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    /// Create a new band
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Band between two bounds given in any order
    fn spanning(a: f64, b: f64) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Parameters of the simulated gauge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorModel {
    /// Chance that a sample is a sensor failure
    pub failure_probability: f64,
    /// Chance that a functioning sample is drawn from the extreme ranges
    pub extreme_probability: f64,
    /// Mean water level in meters
    pub base_level: f64,
    /// Normal tidal offset added to the base level
    pub tide_offset: Band,
    /// Surge offset added to the base level in extreme conditions
    pub surge_offset: Band,
    /// Normal temperature, °C
    pub normal_temperature: Band,
    /// Coldest extreme temperature, °C; cold extremes span from here to
    /// the station's `extreme_temp_min`
    pub extreme_temperature_floor: f64,
    /// Hottest extreme temperature, °C; hot extremes span from the
    /// station's `extreme_temp_max` to here
    pub extreme_temperature_ceiling: f64,
    /// Normal wind speed, km/h
    pub normal_wind: Band,
    /// Extreme wind speed, km/h
    pub extreme_wind: Band,
    /// Barometric pressure, hPa
    pub pressure: Band,
}

impl Default for SensorModel {
    fn default() -> Self {
        Self {
            failure_probability: 0.05,
            extreme_probability: 0.10,
            base_level: 1.5,
            tide_offset: Band::new(-0.8, 2.0),
            surge_offset: Band::new(3.0, 5.0),
            normal_temperature: Band::new(10.0, 25.0),
            extreme_temperature_floor: -10.0,
            extreme_temperature_ceiling: 45.0,
            normal_wind: Band::new(5.0, 40.0),
            extreme_wind: Band::new(100.0, 150.0),
            pressure: Band::new(1000.0, 1030.0),
        }
    }
}

impl SensorModel {
    /// Check probabilities and bands
    pub fn validate(&self) -> Result<(), SensorError> {
        for (name, p) in [
            ("failure_probability", self.failure_probability),
            ("extreme_probability", self.extreme_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SensorError::InvalidModel(format!(
                    "{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }

        for (name, value) in [
            ("base_level", self.base_level),
            ("extreme_temperature_floor", self.extreme_temperature_floor),
            ("extreme_temperature_ceiling", self.extreme_temperature_ceiling),
        ] {
            if !value.is_finite() {
                return Err(SensorError::InvalidModel(format!("{} must be finite", name)));
            }
        }

        let bands = [
            ("tide_offset", self.tide_offset),
            ("surge_offset", self.surge_offset),
            ("normal_temperature", self.normal_temperature),
            ("normal_wind", self.normal_wind),
            ("extreme_wind", self.extreme_wind),
            ("pressure", self.pressure),
        ];
        for (name, band) in bands {
            if !band.is_valid() {
                return Err(SensorError::InvalidModel(format!(
                    "{} must be a finite range with min <= max, got {}..{}",
                    name, band.min, band.max
                )));
            }
        }

        Ok(())
    }
}

/// Random tide gauge
#[derive(Debug)]
pub struct SimulatedSensor {
    name: String,
    model: SensorModel,
    // Extreme temperature limits of the station, (min, max)
    temperature_limits: (f64, f64),
    rng: StdRng,
}

impl SimulatedSensor {
    /// Create a simulated sensor seeded from entropy
    pub fn new(name: impl Into<String>, model: SensorModel) -> Result<Self, SensorError> {
        Self::with_rng(name, model, StdRng::from_entropy())
    }

    /// Create a simulated sensor with a fixed seed
    pub fn seeded(
        name: impl Into<String>,
        model: SensorModel,
        seed: u64,
    ) -> Result<Self, SensorError> {
        Self::with_rng(name, model, StdRng::seed_from_u64(seed))
    }

    fn with_rng(name: impl Into<String>, model: SensorModel, rng: StdRng) -> Result<Self, SensorError> {
        model.validate()?;
        let defaults = ThresholdConfig::default();
        Ok(Self {
            name: name.into(),
            model,
            temperature_limits: (defaults.extreme_temp_min, defaults.extreme_temp_max),
            rng,
        })
    }

    fn extreme_temperature(&mut self) -> f64 {
        let (cold, hot) = self.temperature_limits;
        if self.rng.gen_bool(0.5) {
            let t = Band::spanning(self.model.extreme_temperature_floor, cold).draw(&mut self.rng);
            round_to(t, 1).min(cold)
        } else {
            let t = Band::spanning(hot, self.model.extreme_temperature_ceiling).draw(&mut self.rng);
            round_to(t, 1).max(hot)
        }
    }
}

impl SensorSource for SimulatedSensor {
    fn sample(&mut self) -> Result<SensorReading, SensorError> {
        if self.rng.gen_bool(self.model.failure_probability) {
            let health = if self.rng.gen_bool(0.5) {
                SensorHealth::ReadFailure
            } else {
                SensorHealth::Disconnected
            };
            return Ok(SensorReading::failed(health));
        }

        let (level, temperature, wind) = if self.rng.gen_bool(self.model.extreme_probability) {
            let temperature = self.extreme_temperature();
            let model = &self.model;
            (
                model.base_level + model.surge_offset.draw(&mut self.rng),
                temperature,
                model.extreme_wind.draw(&mut self.rng),
            )
        } else {
            let model = &self.model;
            (
                model.base_level + model.tide_offset.draw(&mut self.rng),
                round_to(model.normal_temperature.draw(&mut self.rng), 1),
                model.normal_wind.draw(&mut self.rng),
            )
        };
        let pressure = self.model.pressure.draw(&mut self.rng);

        Ok(SensorReading::functioning(
            round_to(level, 2),
            temperature,
            round_to(wind, 1),
            round_to(pressure, 1),
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_thresholds(&mut self, thresholds: &ThresholdConfig) {
        self.temperature_limits = (thresholds.extreme_temp_min, thresholds.extreme_temp_max);
    }
}
