//! Core error types for burnupdown-core.
//!
//! This module defines the error hierarchy using thiserror. Engine errors are
//! kept separate from configuration and tracker errors so the pure chart
//! computation never has to carry I/O failure modes.

use std::path::PathBuf;
use thiserror::Error;

use chrono::{DateTime, FixedOffset};

/// Core error type for burnupdown-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Chart computation errors
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tracker client errors
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal conditions of the sprint metrics engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    /// Two instants used in one computation carry different offsets
    #[error("Timezone mismatch: expected {expected}, found {found}")]
    TimezoneMismatch {
        expected: FixedOffset,
        found: FixedOffset,
    },

    /// An issue referenced by scope or resolution data has no effort entry
    #[error("No effort entry for issue {0}")]
    MissingEffort(String),

    /// Sprint end precedes sprint start
    #[error("Invalid sprint: end ({end}) is before start ({start})")]
    InvalidSprint {
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    },

    /// A series went through weekend compression a second time
    #[error("Series '{series}' has already been compressed")]
    AlreadyCompressed { series: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors raised while talking to the issue tracker.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker answered with a non-success status
    #[error("Tracker returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// A payload was missing a field or had an unexpected shape
    #[error("Unexpected tracker payload: {0}")]
    Payload(String),

    /// A timestamp could not be parsed
    #[error("Unparseable timestamp: {value}")]
    Timestamp { value: String },

    /// No username configured for the tracker
    #[error("Tracker is not connected: set tracker.username first")]
    NotConnected,

    /// Work logs were requested without a support board to read them from
    #[error("No support board configured: set support_board first")]
    NoSupportBoard,

    /// The configured base URL is unusable
    #[error("Invalid tracker URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
