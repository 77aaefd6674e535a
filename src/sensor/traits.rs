//! Trait definitions for sensor sources
//!
//! Stations sample through this trait so the simulated gauge can be swapped
//! for scripted readings in tests.

use crate::domain::{SensorReading, ThresholdConfig};
use crate::error::SensorError;

/// A source of tide-gauge readings
pub trait SensorSource: Send {
    /// Take one reading.
    ///
    /// A failed sensor is a successful sample with a non-functioning health;
    /// `Err` means the source itself could not produce a sample.
    fn sample(&mut self) -> Result<SensorReading, SensorError>;

    /// Source name for logs
    fn name(&self) -> &str;

    /// Receive the thresholds the next sample will be evaluated against.
    ///
    /// Called before every sample. Sources that do not depend on the
    /// thresholds ignore it.
    fn set_thresholds(&mut self, _thresholds: &ThresholdConfig) {}
}

impl<S: SensorSource + ?Sized> SensorSource for Box<S> {
    fn sample(&mut self) -> Result<SensorReading, SensorError> {
        (**self).sample()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn set_thresholds(&mut self, thresholds: &ThresholdConfig) {
        (**self).set_thresholds(thresholds)
    }
}
