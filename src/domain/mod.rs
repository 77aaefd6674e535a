//! Domain models for tidewatch
//!
//! This module contains the value types shared by sensors, the evaluator and
//! stations. Threshold updates are validated on application.

pub mod reading;
pub mod thresholds;

pub use reading::{round_to, SensorHealth, SensorReading};
pub use thresholds::{ConfigKey, ThresholdConfig, UpdateReport, MAX_READING_INTERVAL};
