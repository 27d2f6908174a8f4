//! # Error Types
//!
//! Custom error types for Touch Telemetry using `thiserror`.

use thiserror::Error;

/// Main error type for Touch Telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Radio frame could not be decoded
    #[error("Radio frame error: {0}")]
    Frame(String),

    /// Node identity outside the accepted range or not a number
    #[error("Invalid node identity: {0}")]
    InvalidIdentity(String),

    /// A required request parameter was absent
    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    /// Hardware read failed
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// Link-layer send failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP client errors (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP push answered with something other than 200
    #[error("HTTP push rejected with status {0}")]
    HttpStatus(u16),

    /// Identity persistence failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Touch Telemetry
pub type Result<T> = std::result::Result<T, TelemetryError>;
