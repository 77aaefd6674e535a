//! Sensor abstraction layer
//!
//! Provides the [`SensorSource`] trait with a simulated gauge for live runs
//! and a scripted one for forced readings and tests.

pub mod replay;
pub mod simulated;
pub mod traits;

pub use replay::ReplaySensor;
pub use simulated::{Band, SensorModel, SimulatedSensor};
pub use traits::SensorSource;
