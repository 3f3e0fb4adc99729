//! # Level Math
//!
//! Numeric helpers for river level series.
//! This crate provides regression error metrics used to evaluate forecasts
//! and descriptive statistics used to screen historical readings.

use thiserror::Error;

pub mod metrics;
pub mod statistics;

/// Errors that can occur in level calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for level math operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MathError::InsufficientData("no values".to_string());
        assert_eq!(err.to_string(), "Insufficient data for calculation: no values");

        let err = MathError::InvalidInput("length mismatch".to_string());
        assert!(err.to_string().contains("length mismatch"));
    }
}
