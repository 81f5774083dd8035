//! Error types shared across the crate.

use crate::core::{DeviceId, SafeZoneId};
use thiserror::Error;

/// Failures reading or writing the device/zone directory.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DirectoryError {
    #[error("Directory unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Unknown device '{0}'")]
    UnknownDevice(DeviceId),

    #[error("Unknown safe zone '{0}'")]
    UnknownZone(SafeZoneId),
}

/// Failures delivering a notification. Always logged and swallowed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SinkError {
    #[error("No notification address for device '{0}'")]
    MissingAddress(DeviceId),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Invalid debounce configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Buffer must be finite and non-negative (got {0})")]
    InvalidBuffer(f64),

    #[error("At least one consecutive reading is required to confirm a transition")]
    ZeroReadings,

    #[error("Invalid configuration document: {0}")]
    Malformed(String),
}

/// Errors that can occur when assembling a detector.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Directory not specified. Call .directory(directory) before .build()")]
    MissingDirectory,

    #[error("Notification sink not specified. Call .sink(sink) before .build()")]
    MissingSink,

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

/// Failures starting or stopping a [`Monitor`](crate::monitor::Monitor).
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("No async runtime available to run the monitor")]
    NoRuntime,

    #[error("Monitor task ended abnormally: {0}")]
    TaskFailed(String),
}
