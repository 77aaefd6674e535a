//! Monitoring stations
//!
//! A [`Station`] owns one sensor, one threshold configuration, one set of
//! statistics and a background sampling thread:
//!
//! ```text
//! Stopped --start--> Running --stop--> StopRequested --(loop exits)--> Stopped
//! ```
//!
//! Each cycle samples the sensor, evaluates the reading against a snapshot of
//! the thresholds, records statistics and publishes any alert on the
//! station's [`EventBus`]. The wait between cycles is cancelled by `stop`.

pub mod manager;
mod signal;
pub mod statistics;

pub use manager::{simulated_sensors, BatchReport, ManagerView, SensorFactory, StationManager};
pub use statistics::Statistics;

use crate::alerts::{self, Alert, EventBus};
use crate::domain::{ThresholdConfig, UpdateReport};
use crate::error::{ConfigError, SensorError, StationError};
use crate::sensor::SensorSource;
use signal::StopSignal;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle state of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Stopped,
    Running,
    StopRequested,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Running => write!(f, "running"),
            Self::StopRequested => write!(f, "stopping"),
        }
    }
}

/// Result of [`Station::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The station was not running; nothing was done
    NotRunning,
    /// The sampling loop exited and was joined
    Stopped,
    /// The loop did not exit in time and was detached
    TimedOut,
}

/// Timing options of a station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationOptions {
    /// How long `stop` waits for the sampling loop to exit
    pub shutdown_timeout: Duration,
    /// Wait after a failed cycle before sampling again
    pub error_backoff: Duration,
    /// Seed for the interval randomness; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for StationOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(2),
            error_backoff: Duration::from_secs(1),
            seed: None,
        }
    }
}

/// Point-in-time view of a station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationView {
    pub id: String,
    pub state: LifecycleState,
    pub running: bool,
    pub statistics: Statistics,
    pub configuration: ThresholdConfig,
}

type StopListener = Box<dyn Fn(&StationView) + Send + Sync>;

/// State shared with the sampling thread
struct Shared {
    id: String,
    thresholds: RwLock<ThresholdConfig>,
    statistics: Mutex<Statistics>,
    sensor: Mutex<Box<dyn SensorSource>>,
    bus: Arc<EventBus>,
}

impl Shared {
    fn thresholds(&self) -> ThresholdConfig {
        *self.thresholds.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn statistics(&self) -> Statistics {
        *self.statistics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sample, evaluate, count and publish once
    fn run_cycle(&self, thresholds: &ThresholdConfig) -> Result<Option<Alert>, SensorError> {
        let reading = {
            let mut sensor = self.sensor.lock().unwrap_or_else(PoisonError::into_inner);
            sensor.set_thresholds(thresholds);
            sensor.sample()?
        };
        log::debug!("Station {}: {}", self.id, reading);

        let alert = alerts::evaluate(&self.id, &reading, thresholds);

        {
            let mut stats = self.statistics.lock().unwrap_or_else(PoisonError::into_inner);
            stats.record_reading();
            if let Some(alert) = &alert {
                stats.record_alert(alert);
            }
        }

        if let Some(alert) = &alert {
            self.bus.publish(alert);
        }

        Ok(alert)
    }
}

struct Run {
    signal: Arc<StopSignal>,
    exited: mpsc::Receiver<()>,
    handle: JoinHandle<()>,
}

struct Lifecycle {
    state: LifecycleState,
    run: Option<Run>,
    runs: u64,
}

/// A tide-gauge monitoring station
pub struct Station {
    shared: Arc<Shared>,
    options: StationOptions,
    lifecycle: Mutex<Lifecycle>,
    state_changed: Condvar,
    listeners: Mutex<Vec<StopListener>>,
}

impl Station {
    /// Create a stopped station with default thresholds
    pub fn new<S>(id: impl Into<String>, sensor: S, bus: Arc<EventBus>) -> Self
    where
        S: SensorSource + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                thresholds: RwLock::new(ThresholdConfig::default()),
                statistics: Mutex::new(Statistics::default()),
                sensor: Mutex::new(Box::new(sensor) as Box<dyn SensorSource>),
                bus,
            }),
            options: StationOptions::default(),
            lifecycle: Mutex::new(Lifecycle {
                state: LifecycleState::Stopped,
                run: None,
                runs: 0,
            }),
            state_changed: Condvar::new(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Builder: set the initial thresholds, rejecting an invalid record
    pub fn with_thresholds(self, thresholds: ThresholdConfig) -> Result<Self, ConfigError> {
        thresholds.validate()?;
        *self
            .shared
            .thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner) = thresholds;
        Ok(self)
    }

    /// Builder: set timing options
    pub fn with_options(mut self, options: StationOptions) -> Self {
        self.options = options;
        self
    }

    /// Station identifier
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Event bus this station publishes to
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.shared.bus
    }

    /// Timing options
    pub fn options(&self) -> &StationOptions {
        &self.options
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.lock_lifecycle().state
    }

    /// Check if the sampling loop is running
    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Copy of the current thresholds
    pub fn configuration(&self) -> ThresholdConfig {
        self.shared.thresholds()
    }

    /// Copy of the current statistics
    pub fn statistics(&self) -> Statistics {
        self.shared.statistics()
    }

    /// Consistent copy of state, statistics and configuration.
    ///
    /// The lifecycle lock is held while copying, so the state cannot change
    /// under the view. Statistics are copied under their own lock as a unit.
    pub fn snapshot(&self) -> StationView {
        let lifecycle = self.lock_lifecycle();
        self.view(lifecycle.state)
    }

    // Lock order: lifecycle, then statistics or thresholds. The sampling
    // thread never takes the lifecycle lock.
    fn view(&self, state: LifecycleState) -> StationView {
        StationView {
            id: self.shared.id.clone(),
            state,
            running: state == LifecycleState::Running,
            statistics: self.statistics(),
            configuration: self.configuration(),
        }
    }

    /// Register a listener that receives the final view after each stop
    pub fn on_stopped<F>(&self, listener: F)
    where
        F: Fn(&StationView) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Apply `key = value` threshold updates.
    ///
    /// Safe while the loop runs: each cycle evaluates against a whole copy
    /// of the thresholds taken before or after the update, never a mix.
    pub fn update_configuration<K: AsRef<str>>(&self, updates: &[(K, f64)]) -> UpdateReport {
        let report = self
            .shared
            .thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .apply_updates(updates);

        for key in &report.applied {
            log::info!("Station {}: configuration updated: {}", self.id(), key);
        }
        for err in &report.rejected {
            log::warn!("Station {}: {}", self.id(), err);
        }
        report
    }

    /// Start the sampling loop on its own thread
    pub fn start(&self) -> Result<(), StationError> {
        let mut lifecycle = self.lock_lifecycle();
        if lifecycle.state != LifecycleState::Stopped {
            return Err(StationError::AlreadyRunning(self.id().to_string()));
        }

        let signal = Arc::new(StopSignal::new());
        let (exited_tx, exited) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        let token = Arc::clone(&signal);
        let backoff = self.options.error_backoff;
        let seed = self.options.seed.map(|s| s.wrapping_add(lifecycle.runs));

        let handle = thread::Builder::new()
            .name(format!("station-{}", self.id()))
            .spawn(move || {
                sampling_loop(&shared, &token, backoff, seed);
                let _ = exited_tx.send(());
            })?;

        lifecycle.runs += 1;
        lifecycle.state = LifecycleState::Running;
        lifecycle.run = Some(Run {
            signal,
            exited,
            handle,
        });
        log::info!("Station {} started", self.id());
        Ok(())
    }

    /// Stop the sampling loop.
    ///
    /// Idempotent: returns [`StopOutcome::NotRunning`] when already stopped.
    /// A caller arriving while another stop is in progress waits for it and
    /// also gets `NotRunning`; only the first caller notifies listeners.
    pub fn stop(&self) -> StopOutcome {
        let mut lifecycle = self.lock_lifecycle();
        loop {
            let state = lifecycle.state;
            match state {
                LifecycleState::Stopped => return StopOutcome::NotRunning,
                LifecycleState::StopRequested => {
                    lifecycle = self
                        .state_changed
                        .wait(lifecycle)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                LifecycleState::Running => break,
            }
        }

        lifecycle.state = LifecycleState::StopRequested;
        let run = lifecycle.run.take();
        drop(lifecycle);

        log::info!("Stopping station {}...", self.id());
        let outcome = match run {
            Some(run) => self.drain(run),
            None => StopOutcome::Stopped,
        };

        let view = {
            let mut lifecycle = self.lock_lifecycle();
            lifecycle.state = LifecycleState::Stopped;
            self.view(lifecycle.state)
        };
        self.state_changed.notify_all();

        for listener in self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            listener(&view);
        }
        log::info!(
            "Station {} stopped ({} alerts, {} readings)",
            self.id(),
            view.statistics.total_alerts,
            view.statistics.readings
        );

        outcome
    }

    fn drain(&self, run: Run) -> StopOutcome {
        let started = Instant::now();
        run.signal.cancel();

        match run.exited.recv_timeout(self.options.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if run.handle.join().is_err() {
                    log::error!("Station {}: sampling thread panicked", self.id());
                }
                log::debug!("Station {}: loop joined in {:?}", self.id(), started.elapsed());
                StopOutcome::Stopped
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Station {}: sampling loop did not exit within {:?}, detaching it",
                    self.id(),
                    self.options.shutdown_timeout
                );
                StopOutcome::TimedOut
            }
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Station")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .field("options", &self.options)
            .finish()
    }
}

impl Drop for Station {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sampling_loop(shared: &Shared, signal: &StopSignal, backoff: Duration, seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    log::debug!("Station {}: sampling loop started", shared.id);

    while !signal.is_cancelled() {
        let thresholds = shared.thresholds();

        let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
            shared
                .run_cycle(&thresholds)
                .map(|_| next_interval(&mut rng, &thresholds))
        }));

        let wait = match cycle {
            Ok(Ok(Some(wait))) => wait,
            Ok(Ok(None)) => {
                log::warn!(
                    "Station {}: unusable reading interval {}..{} s, backing off",
                    shared.id,
                    thresholds.min_reading_interval,
                    thresholds.max_reading_interval
                );
                backoff
            }
            Ok(Err(e)) => {
                log::warn!("Station {}: sampling failed: {}", shared.id, e);
                backoff
            }
            Err(payload) => {
                log::error!(
                    "Station {}: monitoring cycle panicked: {}",
                    shared.id,
                    panic_message(payload.as_ref())
                );
                backoff
            }
        };

        if signal.wait(wait) {
            break;
        }
    }

    log::debug!("Station {}: sampling loop exited", shared.id);
}

/// Draw the wait before the next reading from the configured bounds.
///
/// `None` when the bounds are not a usable range of durations.
fn next_interval<R: Rng>(rng: &mut R, thresholds: &ThresholdConfig) -> Option<Duration> {
    let (min, max) = (
        thresholds.min_reading_interval,
        thresholds.max_reading_interval,
    );
    if !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max) {
        return None;
    }
    Duration::try_from_secs_f64(rng.gen_range(min..=max)).ok()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertKind;
    use crate::domain::{SensorHealth, SensorReading};
    use crate::sensor::ReplaySensor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn calm() -> SensorReading {
        SensorReading::functioning(1.0, 18.0, 10.0, 1013.0)
    }

    fn quick_options() -> StationOptions {
        StationOptions {
            shutdown_timeout: Duration::from_secs(2),
            error_backoff: Duration::from_millis(10),
            seed: Some(1),
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_new_station_is_stopped() {
        let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()));
        let view = station.snapshot();
        assert_eq!(view.id, "A");
        assert_eq!(view.state, LifecycleState::Stopped);
        assert!(!view.running);
        assert_eq!(view.statistics, Statistics::default());
        assert_eq!(view.configuration, ThresholdConfig::default());
    }

    #[test]
    fn test_start_twice_fails() {
        let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
            .with_options(quick_options());

        station.start().unwrap();
        let err = station.start().unwrap_err();
        assert!(matches!(err, StationError::AlreadyRunning(ref id) if id == "A"));
        assert!(station.is_running());

        assert_eq!(station.stop(), StopOutcome::Stopped);
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        station.on_stopped(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(station.stop(), StopOutcome::NotRunning);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_final_statistics_emitted_once_per_stop() {
        let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
            .with_options(quick_options());
        let views = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&views);
        station.on_stopped(move |view| sink.lock().unwrap().push(view.clone()));

        station.start().unwrap();
        assert_eq!(station.stop(), StopOutcome::Stopped);
        assert_eq!(station.stop(), StopOutcome::NotRunning);

        let views = views.lock().unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].state, LifecycleState::Stopped);
        assert!(!views[0].running);
    }

    #[test]
    fn test_restart_keeps_statistics() {
        let failure = SensorReading::failed(SensorHealth::ReadFailure);
        let station = Station::new("A", ReplaySensor::cycle([failure]), Arc::new(EventBus::new()))
            .with_options(quick_options());
        station.update_configuration(&[
            ("min_reading_interval", 0.001),
            ("max_reading_interval", 0.001),
        ]);

        station.start().unwrap();
        assert!(wait_until(|| station.statistics().sensor_failure >= 1));
        station.stop();
        let first = station.statistics().total_alerts;

        station.start().unwrap();
        assert!(wait_until(|| station.statistics().total_alerts > first));
        station.stop();

        let stats = station.statistics();
        assert_eq!(stats.total_alerts, stats.sensor_failure);
        assert_eq!(stats.extreme_conditions, 0);
    }

    #[test]
    fn test_sampling_errors_do_not_stop_the_loop() {
        let bus = Arc::new(EventBus::new());
        let station = Station::new("A", ReplaySensor::once([calm()]), Arc::clone(&bus))
            .with_options(quick_options());
        station.update_configuration(&[
            ("min_reading_interval", 0.001),
            ("max_reading_interval", 0.001),
        ]);

        station.start().unwrap();
        assert!(wait_until(|| station.statistics().readings == 1));
        // Exhausted sensor keeps failing; the loop backs off and keeps going
        thread::sleep(Duration::from_millis(50));
        assert!(station.is_running());
        assert_eq!(station.stop(), StopOutcome::Stopped);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let bus = Arc::new(EventBus::new());
        bus.register(AlertKind::SensorFailure, |_: &Alert| panic!("handler bug"));

        let failure = SensorReading::failed(SensorHealth::Disconnected);
        let station = Station::new("A", ReplaySensor::cycle([failure]), Arc::clone(&bus))
            .with_options(quick_options());

        station.start().unwrap();
        assert!(wait_until(|| station.statistics().sensor_failure >= 2));
        assert!(station.is_running());
        assert_eq!(station.stop(), StopOutcome::Stopped);
    }

    #[test]
    fn test_update_configuration_reports_rejections() {
        let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()));
        let report = station.update_configuration(&[
            ("extreme_tide_threshold".to_string(), 4.5),
            ("tsunami_threshold".to_string(), 9.0),
        ]);

        assert_eq!(report.rejected_keys(), vec!["tsunami_threshold"]);
        assert_eq!(station.configuration().extreme_tide_threshold, 4.5);
    }

    #[test]
    fn test_next_interval_within_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let thresholds = ThresholdConfig::default();
        for _ in 0..100 {
            let wait = next_interval(&mut rng, &thresholds).unwrap();
            assert!(wait >= Duration::from_millis(500) && wait <= Duration::from_secs(3));
        }
    }

    #[test]
    fn test_next_interval_unusable_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        for (min, max) in [(1e20, 1e20), (5.0, 1.0), (-1.0, 1.0), (0.5, f64::INFINITY)] {
            let thresholds = ThresholdConfig {
                min_reading_interval: min,
                max_reading_interval: max,
                ..Default::default()
            };
            assert_eq!(next_interval(&mut rng, &thresholds), None, "{}..{}", min, max);
        }
    }

    #[test]
    fn test_with_thresholds_rejects_invalid_record() {
        let inverted = ThresholdConfig {
            min_reading_interval: 5.0,
            max_reading_interval: 1.0,
            ..Default::default()
        };
        let result = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
            .with_thresholds(inverted);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let oversized = ThresholdConfig {
            min_reading_interval: 1e20,
            max_reading_interval: 1e20,
            ..Default::default()
        };
        let result = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
            .with_thresholds(oversized);
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_interval_update_keeps_loop_alive() {
        let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
            .with_options(quick_options());
        station.update_configuration(&[
            ("min_reading_interval", 0.001),
            ("max_reading_interval", 0.001),
        ]);
        station.start().unwrap();
        assert!(wait_until(|| station.statistics().readings >= 1));

        let report = station.update_configuration(&[
            ("min_reading_interval", 1e20),
            ("max_reading_interval", 1e20),
        ]);
        assert!(!report.is_clean());

        let seen = station.statistics().readings;
        assert!(wait_until(|| station.statistics().readings >= seen + 5));
        assert!(station.is_running());
        assert_eq!(station.stop(), StopOutcome::Stopped);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
