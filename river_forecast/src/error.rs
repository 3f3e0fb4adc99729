//! Error types for the river_forecast crate

use thiserror::Error;

/// Custom error types for the river_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A monthly record disagrees with the calendar
    #[error("Malformed record for {year}/{month:02}: {reason}")]
    MalformedRecord {
        year: i32,
        month: i32,
        reason: String,
    },

    /// A (year, month) pair appeared twice under the `reject` policy
    #[error("Duplicate record for {year}/{month:02}")]
    DuplicateRecord { year: i32, month: u32 },

    /// The dataset flattened to zero observations
    #[error("Dataset contains no observations")]
    EmptyDataset,

    /// Too few observations for a train/test split
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Calendrically invalid (year, month, day) combination
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The model was trained under a different feature definition
    #[error("Feature schema mismatch: model expects {expected}, encoder provides {found}")]
    SchemaMismatch { expected: String, found: String },

    /// The persisted model artifact is absent or unreadable
    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    /// Error raised while fitting or applying a regressor
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from reading or parsing configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from metric and statistics calculations
    #[error("Math error: {0}")]
    MathError(#[from] level_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON encoding or decoding
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Error from CSV export
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
