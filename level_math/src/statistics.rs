//! Descriptive statistics for level series
//!
//! Contains the screening helpers run over historical readings:
//! - Summary statistics (min, max, mean, median, standard deviation)
//! - Z-scores and z-score outlier detection
//! - Large step detection between consecutive values

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::fmt;

/// Summary statistics of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values
    pub count: usize,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Series Summary:")?;
        writeln!(f, "  Count:   {}", self.count)?;
        writeln!(f, "  Min:     {:.2}", self.min)?;
        writeln!(f, "  Max:     {:.2}", self.max)?;
        writeln!(f, "  Mean:    {:.2}", self.mean)?;
        writeln!(f, "  Median:  {:.2}", self.median)?;
        writeln!(f, "  Std Dev: {:.2}", self.std_dev)?;
        Ok(())
    }
}

fn require_values(values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "At least one value is required".to_string(),
        ));
    }
    if let Some(position) = values.iter().position(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(format!(
            "Value at position {} is not finite",
            position
        )));
    }
    Ok(())
}

/// Summarize a series of finite values
pub fn summarize(values: &[f64]) -> Result<Summary> {
    require_values(values)?;

    Ok(Summary {
        count: values.len(),
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
        mean: values.iter().mean(),
        median: Data::new(values.to_vec()).median(),
        std_dev: values.iter().population_std_dev(),
    })
}

/// Standard scores of every value against the series mean and population
/// standard deviation.
///
/// A series without spread has no meaningful scores; every value then scores 0.
pub fn z_scores(values: &[f64]) -> Result<Vec<f64>> {
    require_values(values)?;

    let mean = values.iter().mean();
    let std_dev = values.iter().population_std_dev();

    if std_dev.abs() < 1e-12 {
        return Ok(vec![0.0; values.len()]);
    }

    Ok(values.iter().map(|v| (v - mean) / std_dev).collect())
}

/// A value whose standard score exceeds the screening threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outlier {
    /// Position in the input series
    pub index: usize,
    /// The value itself
    pub value: f64,
    /// Signed standard score
    pub z_score: f64,
}

/// Values with |z| strictly above `threshold`, most extreme first
pub fn z_score_outliers(values: &[f64], threshold: f64) -> Result<Vec<Outlier>> {
    if threshold <= 0.0 {
        return Err(MathError::InvalidInput(
            "Outlier threshold must be greater than zero".to_string(),
        ));
    }

    let scores = z_scores(values)?;
    let mut outliers: Vec<Outlier> = scores
        .iter()
        .enumerate()
        .filter(|(_, z)| z.abs() > threshold)
        .map(|(index, &z_score)| Outlier {
            index,
            value: values[index],
            z_score,
        })
        .collect();

    outliers.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));
    Ok(outliers)
}

/// A change between two consecutive values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Position of the later value; the earlier one sits at `index - 1`
    pub index: usize,
    /// Earlier value
    pub from: f64,
    /// Later value
    pub to: f64,
}

impl Step {
    /// Absolute size of the change
    pub fn magnitude(&self) -> f64 {
        (self.to - self.from).abs()
    }
}

/// Consecutive changes strictly larger than `threshold`, largest first
pub fn large_steps(values: &[f64], threshold: f64) -> Vec<Step> {
    let mut steps: Vec<Step> = values
        .windows(2)
        .enumerate()
        .map(|(i, pair)| Step {
            index: i + 1,
            from: pair[0],
            to: pair[1],
        })
        .filter(|step| step.magnitude() > threshold)
        .collect();

    steps.sort_by(|a, b| b.magnitude().total_cmp(&a.magnitude()));
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_calculation() {
        let values = vec![10.0, 20.0, 30.0, 40.0];
        let summary = summarize(&values).unwrap();

        assert_eq!(summary.count, 4);
        assert_relative_eq!(summary.min, 10.0);
        assert_relative_eq!(summary.max, 40.0);
        assert_relative_eq!(summary.mean, 25.0);
        assert_relative_eq!(summary.median, 25.0);
        // sqrt((225 + 25 + 25 + 225) / 4)
        assert_relative_eq!(summary.std_dev, 125.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_summary_rejects_empty_and_nan() {
        assert!(matches!(summarize(&[]), Err(MathError::InsufficientData(_))));
        assert!(matches!(
            summarize(&[1.0, f64::NAN]),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_z_score_outliers() {
        let mut values = vec![10.0; 50];
        values[7] = 30.0;
        values[20] = 9.5;

        let outliers = z_score_outliers(&values, 3.0).unwrap();
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers[0].index, 7);
        assert!(outliers[0].z_score > 3.0);
    }

    #[test]
    fn test_flat_series_has_no_outliers() {
        let values = vec![4.2; 10];
        let scores = z_scores(&values).unwrap();
        assert!(scores.iter().all(|z| *z == 0.0));
        assert!(z_score_outliers(&values, 3.0).unwrap().is_empty());
    }

    #[test]
    fn test_large_steps() {
        let values = vec![1.0, 1.5, 4.0, 4.1, 0.5];
        let steps = large_steps(&values, 2.0);

        assert_eq!(steps.len(), 2);
        // Largest first: 4.1 -> 0.5, then 1.5 -> 4.0
        assert_eq!(steps[0].index, 4);
        assert_relative_eq!(steps[0].magnitude(), 3.6, epsilon = 1e-12);
        assert_eq!(steps[1].index, 2);
        assert_relative_eq!(steps[1].magnitude(), 2.5);
    }
}
