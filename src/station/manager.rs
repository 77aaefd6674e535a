//! Station manager
//!
//! Keeps stations in insertion order, starts and stops them in bulk and
//! aggregates their statistics. A failure on one station never prevents the
//! others from being processed.

use super::{Station, StationOptions, StationView, StopOutcome};
use crate::alerts::EventBus;
use crate::domain::ThresholdConfig;
use crate::error::{ConfigError, SensorError, StationError};
use crate::sensor::{SensorModel, SensorSource, SimulatedSensor};

use serde::Serialize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Builds the sensor of a new station from its id and an optional seed
pub type SensorFactory =
    Box<dyn Fn(&str, Option<u64>) -> Result<Box<dyn SensorSource>, SensorError> + Send + Sync>;

/// Factory producing simulated sensors from one model
pub fn simulated_sensors(model: SensorModel) -> SensorFactory {
    Box::new(move |id: &str, seed: Option<u64>| {
        let name = format!("{}-gauge", id);
        let sensor = match seed {
            Some(seed) => SimulatedSensor::seeded(name, model.clone(), seed)?,
            None => SimulatedSensor::new(name, model.clone())?,
        };
        Ok(Box::new(sensor) as Box<dyn SensorSource>)
    })
}

/// Outcome of a bulk start or stop
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Stations processed successfully
    pub succeeded: Vec<String>,
    /// Stations that failed, with the reason
    pub failures: Vec<(String, StationError)>,
}

impl BatchReport {
    /// True when no station failed
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated view of every station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerView {
    /// Station views in insertion order
    pub stations: Vec<StationView>,
    /// Sum of all stations' alert totals
    pub total_alerts: u64,
}

/// Manager of a set of stations sharing one event bus
pub struct StationManager {
    stations: Vec<Arc<Station>>,
    bus: Arc<EventBus>,
    sensors: SensorFactory,
    defaults: ThresholdConfig,
    options: StationOptions,
    start_stagger: Duration,
}

impl StationManager {
    /// Create a manager with simulated sensors and default settings
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            stations: Vec::new(),
            bus,
            sensors: simulated_sensors(SensorModel::default()),
            defaults: ThresholdConfig::default(),
            options: StationOptions::default(),
            start_stagger: Duration::ZERO,
        }
    }

    /// Builder: set how new stations get their sensor
    pub fn with_sensor_factory(mut self, sensors: SensorFactory) -> Self {
        self.sensors = sensors;
        self
    }

    /// Builder: set the thresholds new stations start from
    pub fn with_defaults(mut self, defaults: ThresholdConfig) -> Result<Self, ConfigError> {
        defaults.validate()?;
        self.defaults = defaults;
        Ok(self)
    }

    /// Builder: set timing options of new stations
    pub fn with_options(mut self, options: StationOptions) -> Self {
        self.options = options;
        self
    }

    /// Builder: pause between two station starts in `start_all`
    pub fn with_start_stagger(mut self, stagger: Duration) -> Self {
        self.start_stagger = stagger;
        self
    }

    /// Shared event bus
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Create a station and apply configuration overrides to it.
    ///
    /// Rejected override keys are logged and do not fail the call.
    pub fn add_station<K: AsRef<str>>(
        &mut self,
        id: &str,
        overrides: &[(K, f64)],
    ) -> Result<Arc<Station>, StationError> {
        self.ensure_unique(id)?;

        // Derive distinct but reproducible streams per station
        let seed = self
            .options
            .seed
            .map(|s| s.wrapping_add(self.stations.len() as u64));
        let sensor = (self.sensors)(id, seed)?;
        let options = StationOptions {
            seed: seed.map(|s| !s),
            ..self.options.clone()
        };

        let station = Station::new(id, sensor, Arc::clone(&self.bus))
            .with_thresholds(self.defaults)?
            .with_options(options);

        let report = station.update_configuration(overrides);
        if !report.is_clean() {
            log::warn!(
                "Station {} added with rejected overrides: {}",
                id,
                report.rejected_keys().join(", ")
            );
        }

        Ok(self.push(station))
    }

    /// Add a station built by the caller
    pub fn insert_station(&mut self, station: Station) -> Result<Arc<Station>, StationError> {
        self.ensure_unique(station.id())?;
        Ok(self.push(station))
    }

    /// Stop a station and remove it
    pub fn remove_station(&mut self, id: &str) -> Result<Arc<Station>, StationError> {
        let index = self
            .stations
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| StationError::UnknownStation(id.to_string()))?;

        if self.stations[index].stop() == StopOutcome::TimedOut {
            log::warn!("Station {} removed with its sampling loop still exiting", id);
        }
        log::info!("Station {} removed", id);
        Ok(self.stations.remove(index))
    }

    fn ensure_unique(&self, id: &str) -> Result<(), StationError> {
        if self.station(id).is_some() {
            return Err(StationError::DuplicateStation(id.to_string()));
        }
        Ok(())
    }

    fn push(&mut self, station: Station) -> Arc<Station> {
        let station = Arc::new(station);
        log::info!("Station {} added", station.id());
        self.stations.push(Arc::clone(&station));
        station
    }

    /// Look up a station
    pub fn station(&self, id: &str) -> Option<&Arc<Station>> {
        self.stations.iter().find(|s| s.id() == id)
    }

    /// Station identifiers in insertion order
    pub fn ids(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.id()).collect()
    }

    /// Stations in insertion order
    pub fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }

    /// Number of stations
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    /// Check if there are no stations
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Start every station, in insertion order
    pub fn start_all(&self) -> BatchReport {
        log::info!("Starting {} stations", self.stations.len());
        let mut report = BatchReport::default();

        for (i, station) in self.stations.iter().enumerate() {
            if i > 0 && !self.start_stagger.is_zero() {
                thread::sleep(self.start_stagger);
            }
            match station.start() {
                Ok(()) => report.succeeded.push(station.id().to_string()),
                Err(e) => {
                    log::warn!("{}", e);
                    report.failures.push((station.id().to_string(), e));
                }
            }
        }

        report
    }

    /// Stop every station, in insertion order
    pub fn stop_all(&self) -> BatchReport {
        log::info!("Stopping {} stations", self.stations.len());
        let mut report = BatchReport::default();

        for station in &self.stations {
            match station.stop() {
                StopOutcome::Stopped | StopOutcome::NotRunning => {
                    report.succeeded.push(station.id().to_string())
                }
                StopOutcome::TimedOut => report.failures.push((
                    station.id().to_string(),
                    StationError::ShutdownTimeout {
                        station: station.id().to_string(),
                        timeout: station.options().shutdown_timeout,
                    },
                )),
            }
        }

        report
    }

    /// Snapshot of every station plus the grand total of alerts
    pub fn summary(&self) -> ManagerView {
        let stations: Vec<StationView> = self.stations.iter().map(|s| s.snapshot()).collect();
        let total_alerts = stations.iter().map(|v| v.statistics.total_alerts).sum();
        ManagerView {
            stations,
            total_alerts,
        }
    }
}

impl Drop for StationManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}
