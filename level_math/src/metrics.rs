//! Regression error metrics
//!
//! Contains the metrics used to score a fitted model on held-out data:
//! - Mean Absolute Error (MAE)
//! - Mean Squared Error (MSE)
//! - Root Mean Squared Error (RMSE)
//! - Coefficient of determination (R²)
//!
//! MAE and RMSE are expressed in the units of the inputs.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

fn check_pair(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(MathError::InsufficientData(
            "Actual and predicted values must be non-empty".to_string(),
        ));
    }
    if actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Length mismatch: {} actual values vs {} predictions",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean of the absolute errors
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pair(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Mean of the squared errors
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pair(actual, predicted)?;

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Square root of the mean squared error
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(actual, predicted)?.sqrt())
}

/// Coefficient of determination
///
/// A constant `actual` series has no variance to explain: the score is 1.0
/// when every prediction is exact and 0.0 otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_pair(actual, predicted)?;

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// Regression metrics computed together over one (actual, predicted) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
}

/// Compute MAE, MSE, RMSE and R² in one call
pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> Result<RegressionMetrics> {
    let mae = mean_absolute_error(actual, predicted)?;
    let mse = mean_squared_error(actual, predicted)?;
    let r2 = r_squared(actual, predicted)?;

    Ok(RegressionMetrics {
        mae,
        mse,
        rmse: mse.sqrt(),
        r2,
    })
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Regression Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  R²:    {:.4}", self.r2)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regression_metrics() {
        let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

        // Errors: 2, 2, 3, 3, 2
        assert_relative_eq!(mean_absolute_error(&actual, &predicted).unwrap(), 2.4);
        // Squared: 4, 4, 9, 9, 4 -> 30 / 5
        assert_relative_eq!(mean_squared_error(&actual, &predicted).unwrap(), 6.0);
        assert_relative_eq!(
            root_mean_squared_error(&actual, &predicted).unwrap(),
            6.0f64.sqrt()
        );

        // ss_tot = 400 + 100 + 0 + 100 + 400 = 1000, ss_res = 30
        assert_relative_eq!(r_squared(&actual, &predicted).unwrap(), 0.97, epsilon = 1e-12);
    }

    #[test]
    fn test_rmse_is_root_of_mse() {
        let actual = vec![1.0, 4.0, 2.5, 7.0];
        let predicted = vec![1.5, 3.0, 2.0, 9.0];

        let metrics = regression_metrics(&actual, &predicted).unwrap();
        assert_relative_eq!(metrics.rmse * metrics.rmse, metrics.mse, epsilon = 1e-12);
        assert!(metrics.rmse >= metrics.mae);
    }

    #[test]
    fn test_r_squared_constant_target() {
        let actual = vec![5.0, 5.0, 5.0];
        assert_eq!(r_squared(&actual, &[5.0, 5.0, 5.0]).unwrap(), 1.0);
        assert_eq!(r_squared(&actual, &[4.0, 5.0, 6.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_error_handling() {
        let empty: Vec<f64> = vec![];
        assert!(matches!(
            mean_absolute_error(&empty, &empty),
            Err(MathError::InsufficientData(_))
        ));

        let actual = vec![1.0, 2.0, 3.0];
        let predicted = vec![1.0, 2.0];
        assert!(matches!(
            mean_squared_error(&actual, &predicted),
            Err(MathError::InvalidInput(_))
        ));
    }
}
