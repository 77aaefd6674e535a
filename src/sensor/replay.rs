//! Scripted sensor
//!
//! Replays a fixed list of readings, once or in a loop. Each sample is
//! re-stamped with the time it was taken.

use super::traits::SensorSource;
use crate::domain::SensorReading;
use crate::error::SensorError;
use chrono::Utc;
use std::collections::VecDeque;

/// Sensor that returns a fixed sequence of readings
#[derive(Debug, Clone)]
pub struct ReplaySensor {
    script: Vec<SensorReading>,
    pending: VecDeque<SensorReading>,
    cycle: bool,
}

impl ReplaySensor {
    /// Replay each reading once, then report [`SensorError::Exhausted`]
    pub fn once(readings: impl IntoIterator<Item = SensorReading>) -> Self {
        Self::build(readings, false)
    }

    /// Replay the readings forever
    pub fn cycle(readings: impl IntoIterator<Item = SensorReading>) -> Self {
        Self::build(readings, true)
    }

    fn build(readings: impl IntoIterator<Item = SensorReading>, cycle: bool) -> Self {
        let script: Vec<SensorReading> = readings.into_iter().collect();
        Self {
            pending: script.iter().copied().collect(),
            script,
            cycle,
        }
    }
}

impl SensorSource for ReplaySensor {
    fn sample(&mut self) -> Result<SensorReading, SensorError> {
        if self.pending.is_empty() && self.cycle {
            self.pending.extend(self.script.iter().copied());
        }

        self.pending
            .pop_front()
            .map(|reading| reading.at(Utc::now()))
            .ok_or(SensorError::Exhausted)
    }

    fn name(&self) -> &str {
        "replay"
    }
}
