//! Training and evaluation
//!
//! [`TrainingPipeline::train`] flattens a [`HistoricalDataset`] into dated
//! observations, encodes every date, holds out a seeded random test
//! partition, fits the configured [`Regressor`] on the rest and scores it on
//! the held-out rows.

use crate::data::HistoricalDataset;
use crate::error::{ForecastError, Result};
use crate::features::FeatureEncoder;
use crate::fitted_model::{FittedModel, TrainingSpan};
use crate::models::{FittedRegressor, ForestConfig, Matrix, RandomForest, Regressor};
use level_math::metrics::regression_metrics;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Split and sizing options for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Share of observations held out for evaluation
    pub test_ratio: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
    /// Fewer observations than this fail with `InsufficientData`
    pub min_observations: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            min_observations: 10,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Test ratio must be between 0 and 1 (exclusive), got {}",
                self.test_ratio
            )));
        }
        if self.min_observations < 2 {
            return Err(ForecastError::InvalidParameter(
                "min_observations must be at least 2 to leave rows on both sides of the split"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Disjoint row indices for training and evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_ratio)` rows,
/// keeping at least one row on each side.
pub fn train_test_split(n: usize, test_ratio: f64, seed: u64) -> Result<TrainTestSplit> {
    if n < 2 {
        return Err(ForecastError::InsufficientData {
            required: 2,
            actual: n,
        });
    }
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Test ratio must be between 0 and 1 (exclusive), got {}",
            test_ratio
        )));
    }

    let test_size = ((n as f64 * test_ratio).ceil() as usize).clamp(1, n - 1);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(test_size);
    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}

/// Importance of one named feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Held-out scores of a training run, in meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub train_size: usize,
    pub test_size: usize,
    /// Most important first; empty when the model cannot report them
    pub feature_importances: Vec<FeatureImportance>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Training rows: {}", self.train_size)?;
        writeln!(f, "Test rows:     {}", self.test_size)?;
        writeln!(f, "MAE:  {:.4} m", self.mae)?;
        writeln!(f, "RMSE: {:.4} m", self.rmse)?;
        write!(f, "R²:   {:.4}", self.r2)?;

        if !self.feature_importances.is_empty() {
            writeln!(f)?;
            write!(f, "Feature importances:")?;
            for item in &self.feature_importances {
                write!(f, "\n  {:<12} {:.4}", item.feature, item.importance)?;
            }
        }
        Ok(())
    }
}

/// Dataset-to-model training pipeline
#[derive(Debug, Clone)]
pub struct TrainingPipeline<M: Regressor = RandomForest> {
    model: M,
    encoder: FeatureEncoder,
    config: TrainingConfig,
}

impl TrainingPipeline<RandomForest> {
    /// Pipeline around a random forest
    pub fn random_forest(forest: ForestConfig, config: TrainingConfig) -> Result<Self> {
        Self::new(RandomForest::new(forest)?, config)
    }
}

impl<M: Regressor> TrainingPipeline<M> {
    /// Create a pipeline for any regressor
    pub fn new(model: M, config: TrainingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            model,
            encoder: FeatureEncoder::new(),
            config,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Feature matrix and targets for every observation in `dataset`
    pub fn build_design(&self, dataset: &HistoricalDataset) -> Result<(Matrix, Vec<f64>)> {
        let observations = dataset.observations();
        let rows: Vec<_> = observations
            .iter()
            .map(|obs| self.encoder.encode(obs.date).to_array())
            .collect();
        let targets = observations.iter().map(|obs| obs.level).collect();

        Ok((Matrix::from_rows(&rows)?, targets))
    }

    /// Fit and evaluate on `dataset`
    pub fn train(
        &self,
        dataset: &HistoricalDataset,
    ) -> Result<(FittedModel<M::Fitted>, EvaluationReport)> {
        let observations = dataset.observations();
        let (start, end) = match (observations.first(), observations.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Err(ForecastError::EmptyDataset),
        };
        if observations.len() < self.config.min_observations {
            return Err(ForecastError::InsufficientData {
                required: self.config.min_observations,
                actual: observations.len(),
            });
        }

        let (x, y) = self.build_design(dataset)?;
        let split = train_test_split(x.n_rows(), self.config.test_ratio, self.config.seed)?;
        debug!(
            "Split {} observations into {} training and {} test rows",
            x.n_rows(),
            split.train.len(),
            split.test.len()
        );

        let x_train = x.select_rows(&split.train);
        let y_train: Vec<f64> = split.train.iter().map(|&i| y[i]).collect();
        let x_test = x.select_rows(&split.test);
        let y_test: Vec<f64> = split.test.iter().map(|&i| y[i]).collect();

        info!("Fitting {} on {} rows", self.model.name(), x_train.n_rows());
        let fitted = self.model.fit(&x_train, &y_train)?;

        let predictions = fitted.predict(&x_test)?;
        let metrics = regression_metrics(&y_test, &predictions)?;

        let schema = self.encoder.schema().clone();
        let mut feature_importances: Vec<FeatureImportance> = fitted
            .feature_importances()
            .map(|values| {
                schema
                    .features
                    .iter()
                    .zip(values)
                    .map(|(feature, importance)| FeatureImportance {
                        feature: feature.clone(),
                        importance,
                    })
                    .collect()
            })
            .unwrap_or_default();
        feature_importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));

        let report = EvaluationReport {
            mae: metrics.mae,
            rmse: metrics.rmse,
            r2: metrics.r2,
            train_size: split.train.len(),
            test_size: split.test.len(),
            feature_importances,
        };
        info!(
            "Evaluation: MAE {:.4}, RMSE {:.4}, R² {:.4}",
            report.mae, report.rmse, report.r2
        );

        let span = TrainingSpan {
            start,
            end,
            observations: observations.len(),
        };
        Ok((FittedModel::new(schema, span, fitted), report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_sizes_follow_ceiling() {
        let split = train_test_split(101, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 21);
        assert_eq!(split.train.len(), 80);

        let split = train_test_split(10, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_split_is_a_partition() {
        let split = train_test_split(57, 0.2, 7).unwrap();
        let train: HashSet<_> = split.train.iter().copied().collect();
        let test: HashSet<_> = split.test.iter().copied().collect();

        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 57);
        assert!(train.union(&test).all(|&i| i < 57));
    }

    #[test]
    fn test_split_is_seeded() {
        assert_eq!(
            train_test_split(40, 0.25, 3).unwrap(),
            train_test_split(40, 0.25, 3).unwrap()
        );
        assert_ne!(
            train_test_split(40, 0.25, 3).unwrap(),
            train_test_split(40, 0.25, 4).unwrap()
        );
    }

    #[test]
    fn test_split_keeps_both_sides_nonempty() {
        let split = train_test_split(2, 0.9, 1).unwrap();
        assert_eq!(split.train.len(), 1);
        assert_eq!(split.test.len(), 1);
        assert!(train_test_split(1, 0.2, 1).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(TrainingConfig::default().validate().is_ok());
        let bad = TrainingConfig {
            test_ratio: 1.0,
            ..TrainingConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = TrainingConfig {
            min_observations: 1,
            ..TrainingConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
