//! Telemetry error types.

use thiserror::Error;

/// Errors raised while configuring or installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log configuration is invalid (bad level, directive or format).
    #[error("invalid log configuration: {0}")]
    ConfigError(String),

    /// A global subscriber is already installed or the appender failed.
    #[error("failed to initialize logging: {0}")]
    InitError(String),

    /// IO error while preparing a log directory.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
