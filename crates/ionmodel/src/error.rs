//! Error types for the ionosphere model.

use thiserror::Error;

use crate::source::SampleCoordinate;

/// Errors that can occur while building, querying or persisting a model.
#[derive(Error, Debug)]
pub enum IonModelError {
    /// Invalid construction parameters. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The data source kept failing at one coordinate after all retries.
    #[error("data source failed at {coordinate} after {attempts} attempt(s): {message}")]
    DataSource {
        coordinate: SampleCoordinate,
        attempts: u32,
        message: String,
    },

    /// Query outside the modeled time window or view disc.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Save/load failure or on-disk format mismatch.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The external frame renderer rejected the gathered frames.
    #[error("render error: {0}")]
    Render(String),
}

impl IonModelError {
    /// Create a Configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an OutOfRange error.
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    /// Create a Persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a Render error.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Whether the caller can recover by adjusting the query (e.g. `recalc`).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}

impl From<std::io::Error> for IonModelError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for IonModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(format!("invalid model manifest: {}", err))
    }
}

/// Result type for ionosphere model operations.
pub type Result<T> = std::result::Result<T, IonModelError>;
