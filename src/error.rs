//! Unified error types for tidewatch
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from station lifecycle or manager operations
    #[error("Station error: {0}")]
    Station(#[from] StationError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from a sensor source
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// IO error (file operations, terminal output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ctrl+C handler could not be installed
    #[error("Failed to set signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Errors from station lifecycle and station manager operations
#[derive(Error, Debug)]
pub enum StationError {
    /// `start` called on a station that is not stopped
    #[error("Station '{0}' is already running")]
    AlreadyRunning(String),

    /// A station with this identifier is already registered
    #[error("Station '{0}' already exists")]
    DuplicateStation(String),

    /// No station with this identifier is registered
    #[error("Station '{0}' not found")]
    UnknownStation(String),

    /// The sampling loop did not exit within the join window.
    ///
    /// The station is still marked stopped; this is a diagnostic.
    #[error("Station '{station}' sampling loop did not exit within {timeout:?}")]
    ShutdownTimeout { station: String, timeout: Duration },

    /// The sampling thread could not be spawned
    #[error("Failed to spawn sampling thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The station's sensor could not be created
    #[error("Sensor setup failed: {0}")]
    Sensor(#[from] SensorError),

    /// Initial thresholds failed validation
    #[error("Invalid station configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown configuration key in an update
    #[error("Invalid configuration key: '{0}'")]
    InvalidKey(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors from sensor sources
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// A scripted sensor has no readings left
    #[error("Sensor has no more readings")]
    Exhausted,

    /// The simulation model is inconsistent
    #[error("Invalid sensor model: {0}")]
    InvalidModel(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
