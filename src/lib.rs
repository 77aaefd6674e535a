//! tidewatch - tide-gauge monitoring library
//!
//! This library provides monitoring stations that sample tide gauges on
//! background threads, classify each reading against configurable
//! thresholds and dispatch alerts to registered handlers.
//!
//! # Modules
//!
//! - [`alerts`]: Alert types, evaluator and event bus
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Readings and threshold configuration
//! - [`error`]: Error types
//! - [`sensor`]: Sensor sources (simulated and scripted)
//! - [`station`]: Stations and the station manager

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod sensor;
pub mod station;

pub use error::{AppError, Result};
