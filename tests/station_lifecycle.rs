//! End-to-end tests of stations and the station manager

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tidewatch::alerts::{Alert, AlertKind, Condition, EventBus};
use tidewatch::domain::{SensorHealth, SensorReading};
use tidewatch::error::{SensorError, StationError};
use tidewatch::sensor::{ReplaySensor, SensorSource};
use tidewatch::station::{
    LifecycleState, SensorFactory, Station, StationManager, StationOptions, StopOutcome,
};

const FAST: &[(&str, f64)] = &[("min_reading_interval", 0.001), ("max_reading_interval", 0.001)];

fn options() -> StationOptions {
    StationOptions {
        shutdown_timeout: Duration::from_secs(2),
        error_backoff: Duration::from_millis(10),
        seed: Some(11),
    }
}

fn calm() -> SensorReading {
    SensorReading::functioning(1.0, 18.0, 10.0, 1013.0)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

fn collect(bus: &EventBus, kind: AlertKind) -> Arc<Mutex<Vec<Alert>>> {
    let alerts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&alerts);
    bus.register(kind, move |alert: &Alert| sink.lock().unwrap().push(alert.clone()));
    alerts
}

/// Sensor whose every sample blocks for a while
struct SlowSensor(Duration);

impl SensorSource for SlowSensor {
    fn sample(&mut self) -> Result<SensorReading, SensorError> {
        thread::sleep(self.0);
        Ok(calm())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[test]
fn stop_interrupts_a_long_interval() {
    let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
        .with_options(options());
    station.update_configuration(&[
        ("min_reading_interval", 3600.0),
        ("max_reading_interval", 3600.0),
    ]);

    station.start().unwrap();
    assert!(wait_until(|| station.statistics().readings == 1));

    let started = Instant::now();
    assert_eq!(station.stop(), StopOutcome::Stopped);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(station.state(), LifecycleState::Stopped);
}

#[test]
fn forced_extreme_tide_reaches_handler_once() {
    let bus = Arc::new(EventBus::new());
    let extreme = collect(&bus, AlertKind::ExtremeConditions);
    let failures = collect(&bus, AlertKind::SensorFailure);

    let forced = SensorReading::functioning(4.0, 20.0, 10.0, 1013.0);
    let station = Station::new("A", ReplaySensor::once([forced]), Arc::clone(&bus))
        .with_options(options());
    station.update_configuration(FAST);

    station.start().unwrap();
    assert!(wait_until(|| station.statistics().readings == 1));
    assert_eq!(station.stop(), StopOutcome::Stopped);

    let stats = station.statistics();
    assert_eq!(stats.total_alerts, 1);
    assert_eq!(stats.extreme_conditions, 1);
    assert_eq!(stats.sensor_failure, 0);

    let extreme = extreme.lock().unwrap();
    assert_eq!(extreme.len(), 1);
    assert_eq!(extreme[0].station_id, "A");
    assert!(extreme[0].message.contains("extreme tide"));
    assert!(!extreme[0].has_condition(|c| matches!(c, Condition::HighTide(_))));
    assert_eq!(stats.last_alert_at, Some(extreme[0].timestamp));
    assert!(failures.lock().unwrap().is_empty());
}

#[test]
fn sensor_failure_preempts_extreme_values() {
    let bus = Arc::new(EventBus::new());
    let failures = collect(&bus, AlertKind::SensorFailure);
    let extreme = collect(&bus, AlertKind::ExtremeConditions);

    let station = Station::new(
        "A",
        ReplaySensor::once([SensorReading::failed(SensorHealth::Disconnected)]),
        Arc::clone(&bus),
    )
    .with_options(options());
    station.update_configuration(FAST);

    station.start().unwrap();
    assert!(wait_until(|| station.statistics().readings == 1));
    station.stop();

    assert_eq!(failures.lock().unwrap().len(), 1);
    assert!(extreme.lock().unwrap().is_empty());
    assert_eq!(station.statistics().sensor_failure, 1);
}

#[test]
fn configuration_is_never_torn_under_concurrent_updates() {
    const A: &[(&str, f64)] = &[("high_tide_threshold", 1.0), ("extreme_tide_threshold", 2.0)];
    const B: &[(&str, f64)] = &[("high_tide_threshold", 10.0), ("extreme_tide_threshold", 20.0)];

    let bus = Arc::new(EventBus::new());
    let alerts = collect(&bus, AlertKind::ExtremeConditions);

    let reading = SensorReading::functioning(5.0, 20.0, 10.0, 1013.0);
    let station = Arc::new(
        Station::new("A", ReplaySensor::cycle([reading]), Arc::clone(&bus)).with_options(options()),
    );
    station.update_configuration(FAST);
    station.update_configuration(A);

    station.start().unwrap();

    let updater = {
        let station = Arc::clone(&station);
        thread::spawn(move || {
            for i in 0..2000 {
                let report = station.update_configuration(if i % 2 == 0 { B } else { A });
                assert!(report.is_clean());
            }
        })
    };
    updater.join().unwrap();
    assert!(wait_until(|| station.statistics().readings >= 20));
    station.stop();

    // A mix of A's high tide and B's extreme tide would report a high tide
    let alerts = alerts.lock().unwrap();
    assert!(!alerts.is_empty());
    assert!(alerts
        .iter()
        .all(|a| !a.has_condition(|c| matches!(c, Condition::HighTide(_)))));
}

#[test]
fn double_stop_is_a_noop() {
    let station = Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
        .with_options(options());

    station.start().unwrap();
    assert_eq!(station.stop(), StopOutcome::Stopped);
    assert_eq!(station.stop(), StopOutcome::NotRunning);
    assert!(!station.is_running());
}

#[test]
fn concurrent_stops_drain_once() {
    let station = Arc::new(
        Station::new("A", ReplaySensor::cycle([calm()]), Arc::new(EventBus::new()))
            .with_options(options()),
    );
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    station.on_stopped(move |view| {
        assert!(!view.running);
        counter.fetch_add(1, Ordering::SeqCst);
    });

    station.start().unwrap();

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let station = Arc::clone(&station);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                station.stop()
            })
        })
        .collect();
    let outcomes: Vec<StopOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(
        outcomes.iter().filter(|o| **o == StopOutcome::Stopped).count(),
        1
    );
    assert_eq!(
        outcomes.iter().filter(|o| **o == StopOutcome::NotRunning).count(),
        3
    );
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(station.state(), LifecycleState::Stopped);
}

#[test]
fn snapshots_stay_consistent_while_the_loop_runs() {
    let readings = [
        SensorReading::failed(SensorHealth::ReadFailure),
        SensorReading::functioning(4.5, 20.0, 10.0, 1013.0),
        calm(),
    ];
    let station = Arc::new(
        Station::new("A", ReplaySensor::cycle(readings), Arc::new(EventBus::new()))
            .with_options(options()),
    );
    station.update_configuration(FAST);

    let done = Arc::new(AtomicBool::new(false));
    let toggler = {
        let station = Arc::clone(&station);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                let _ = station.start();
                thread::sleep(Duration::from_millis(3));
                station.stop();
            }
        })
    };

    let deadline = Instant::now() + Duration::from_millis(500);
    let mut views = 0;
    while Instant::now() < deadline {
        let view = station.snapshot();
        let stats = view.statistics;
        assert_eq!(
            stats.total_alerts,
            stats.sensor_failure + stats.extreme_conditions
        );
        assert!(stats.total_alerts <= stats.readings);
        assert_eq!(view.running, view.state == LifecycleState::Running);
        views += 1;
    }

    done.store(true, Ordering::SeqCst);
    toggler.join().unwrap();
    station.stop();

    assert!(views > 0);
    assert!(station.statistics().readings > 0);
}

#[test]
fn stuck_loop_times_out_and_station_can_restart() {
    let station = Station::new(
        "A",
        SlowSensor(Duration::from_millis(600)),
        Arc::new(EventBus::new()),
    )
    .with_options(StationOptions {
        shutdown_timeout: Duration::from_millis(50),
        ..options()
    });

    station.start().unwrap();
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    assert_eq!(station.stop(), StopOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_millis(500));
    assert_eq!(station.state(), LifecycleState::Stopped);

    // The detached loop never resumes; a new run starts cleanly
    station.start().unwrap();
    assert!(station.is_running());
    assert!(wait_until(|| station.statistics().readings >= 1));
}

#[test]
fn publish_reaches_each_handler_exactly_once() {
    let bus = EventBus::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    bus.register(AlertKind::SensorFailure, move |_: &Alert| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let alert = Alert::sensor_failure("A", SensorReading::failed(SensorHealth::ReadFailure));
    assert_eq!(bus.publish(&alert), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let reading = SensorReading::functioning(4.5, 20.0, 10.0, 1013.0);
    let extreme = tidewatch::alerts::evaluate("A", &reading, &Default::default()).unwrap();
    assert_eq!(bus.publish(&extreme), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

fn replay_factory(reading: SensorReading) -> SensorFactory {
    Box::new(move |_: &str, _: Option<u64>| Ok(Box::new(ReplaySensor::cycle([reading])) as Box<dyn SensorSource>))
}

#[test]
fn duplicate_station_leaves_one_entry() {
    let mut manager =
        StationManager::new(Arc::new(EventBus::new())).with_sensor_factory(replay_factory(calm()));

    manager.add_station("A", &[("high_tide_threshold", 3.0)]).unwrap();
    let err = manager
        .add_station("A", &[("high_tide_threshold", 1.0)])
        .unwrap_err();

    assert!(matches!(err, StationError::DuplicateStation(ref id) if id == "A"));
    assert_eq!(manager.ids(), vec!["A"]);
    assert_eq!(
        manager.station("A").unwrap().configuration().high_tide_threshold,
        3.0
    );
}

#[test]
fn manager_summary_totals_every_station() {
    let failed = SensorReading::failed(SensorHealth::ReadFailure);
    let mut manager = StationManager::new(Arc::new(EventBus::new()))
        .with_sensor_factory(replay_factory(failed))
        .with_options(options());

    for id in ["north", "south", "east"] {
        manager.add_station(id, FAST).unwrap();
    }

    assert!(manager.start_all().is_ok());
    assert!(wait_until(|| manager
        .stations()
        .iter()
        .all(|s| s.statistics().total_alerts >= 2)));
    let report = manager.stop_all();
    assert!(report.is_ok());
    assert_eq!(report.succeeded, vec!["north", "south", "east"]);

    let summary = manager.summary();
    let sum: u64 = summary
        .stations
        .iter()
        .map(|v| v.statistics.total_alerts)
        .sum();
    assert_eq!(summary.total_alerts, sum);
    assert!(summary.stations.iter().all(|v| !v.running));
}

#[test]
fn stop_all_reports_timeouts_and_continues() {
    let mut manager = StationManager::new(Arc::new(EventBus::new())).with_options(StationOptions {
        shutdown_timeout: Duration::from_millis(50),
        ..options()
    });
    let bus = Arc::clone(manager.bus());

    manager
        .insert_station(
            Station::new("slow", SlowSensor(Duration::from_millis(600)), Arc::clone(&bus))
                .with_options(StationOptions {
                    shutdown_timeout: Duration::from_millis(50),
                    ..options()
                }),
        )
        .unwrap();
    let fast = manager
        .insert_station(Station::new("fast", ReplaySensor::cycle([calm()]), bus).with_options(options()))
        .unwrap();

    assert!(manager.start_all().is_ok());
    thread::sleep(Duration::from_millis(20));

    let report = manager.stop_all();
    assert_eq!(report.succeeded, vec!["fast"]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].1,
        StationError::ShutdownTimeout { ref station, .. } if station == "slow"
    ));
    assert!(!fast.is_running());
    assert!(manager.stations().iter().all(|s| s.state() == LifecycleState::Stopped));
}
