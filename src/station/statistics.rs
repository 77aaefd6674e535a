//! Per-station alert statistics

use crate::alerts::{Alert, AlertKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters kept by a station for its whole lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Readings taken
    pub readings: u64,
    /// Alerts raised, all kinds
    pub total_alerts: u64,
    /// Sensor failure alerts
    pub sensor_failure: u64,
    /// Extreme conditions alerts
    pub extreme_conditions: u64,
    /// Timestamp of the most recent alert
    pub last_alert_at: Option<DateTime<Utc>>,
}

impl Statistics {
    /// Count one reading
    pub fn record_reading(&mut self) {
        self.readings += 1;
    }

    /// Count one alert
    pub fn record_alert(&mut self, alert: &Alert) {
        self.total_alerts += 1;
        match alert.kind {
            AlertKind::SensorFailure => self.sensor_failure += 1,
            AlertKind::ExtremeConditions => self.extreme_conditions += 1,
        }
        self.last_alert_at = Some(alert.timestamp);
    }
}
