//! Data quality checks over the historical corpus

use crate::data::{HistoricalDataset, Observation};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use level_math::statistics::{large_steps, summarize, z_score_outliers, Summary};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Thresholds and row limits for the analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// |z| above this marks an outlier
    pub z_threshold: f64,
    /// Day-to-day change above this many meters is reported
    pub variation_threshold: f64,
    pub max_outliers: usize,
    pub max_variations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            z_threshold: 3.0,
            variation_threshold: 2.0,
            max_outliers: 10,
            max_variations: 30,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.z_threshold > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "z threshold must be positive, got {}",
                self.z_threshold
            )));
        }
        if !(self.variation_threshold >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Variation threshold must not be negative, got {}",
                self.variation_threshold
            )));
        }
        Ok(())
    }
}

/// Overview of a dataset's size and level distribution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub observations: usize,
    pub first_year: i32,
    pub last_year: i32,
    pub levels: Summary,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} monthly records, {} daily observations",
            self.records, self.observations
        )?;
        writeln!(f, "Years: {} to {}", self.first_year, self.last_year)?;
        write!(
            f,
            "Level (m): min {:.2}, max {:.2}, mean {:.2}, median {:.2}, std {:.2}",
            self.levels.min,
            self.levels.max,
            self.levels.mean,
            self.levels.median,
            self.levels.std_dev
        )
    }
}

/// A reading far from the dataset mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelOutlier {
    pub date: NaiveDate,
    pub level: f64,
    pub z_score: f64,
}

/// A large change between two consecutive days of the same month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyVariation {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub from_level: f64,
    pub to_level: f64,
}

impl DailyVariation {
    /// Absolute change in meters
    pub fn change(&self) -> f64 {
        (self.to_level - self.from_level).abs()
    }

    /// Signed change, positive when the river rose
    pub fn delta(&self) -> f64 {
        self.to_level - self.from_level
    }
}

pub fn summarize_dataset(dataset: &HistoricalDataset) -> Result<DatasetSummary> {
    let (first_year, last_year) = dataset.year_range().ok_or(ForecastError::EmptyDataset)?;
    let levels: Vec<f64> = dataset.observations().iter().map(|o| o.level).collect();
    if levels.is_empty() {
        return Err(ForecastError::EmptyDataset);
    }

    Ok(DatasetSummary {
        records: dataset.len(),
        observations: levels.len(),
        first_year,
        last_year,
        levels: summarize(&levels)?,
    })
}

/// Observations whose |z| exceeds `threshold`, most extreme first
pub fn find_outliers(dataset: &HistoricalDataset, threshold: f64) -> Result<Vec<LevelOutlier>> {
    let observations: Vec<Observation> = dataset.observations();
    if observations.is_empty() {
        return Err(ForecastError::EmptyDataset);
    }
    let levels: Vec<f64> = observations.iter().map(|o| o.level).collect();

    Ok(z_score_outliers(&levels, threshold)?
        .into_iter()
        .map(|o| LevelOutlier {
            date: observations[o.index].date,
            level: o.value,
            z_score: o.z_score,
        })
        .collect())
}

/// Day-to-day changes above `threshold` meters, largest first.
///
/// Only consecutive days inside one monthly record are compared, so gaps
/// between months never count as a change.
pub fn find_daily_variations(dataset: &HistoricalDataset, threshold: f64) -> Vec<DailyVariation> {
    let mut variations: Vec<DailyVariation> = dataset
        .records()
        .flat_map(|record| {
            let dates: Vec<NaiveDate> = record.observations().map(|o| o.date).collect();
            large_steps(record.daily_levels(), threshold)
                .into_iter()
                .map(move |step| DailyVariation {
                    from_date: dates[step.index - 1],
                    to_date: dates[step.index],
                    from_level: step.from,
                    to_level: step.to,
                })
        })
        .collect();

    variations.sort_by(|a, b| b.change().total_cmp(&a.change()));
    variations
}
