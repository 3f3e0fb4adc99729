//! Random forest regressor
//!
//! An average of CART trees, each grown on a bootstrap sample of the
//! training rows. Trees are grown in parallel; every tree draws from its own
//! generator seeded from the forest seed, so a fixed seed gives the same
//! forest regardless of thread scheduling.

use crate::error::{ForecastError, Result};
use crate::models::tree::{RegressionTree, TreeConfig};
use crate::models::{check_feature_count, check_training_data, FittedRegressor, Matrix, Regressor};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How many features are considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Every feature
    #[default]
    All,
    /// Square root of the feature count, rounded down
    Sqrt,
    /// A fraction of the feature count, in (0, 1]
    Fraction(f64),
    /// A fixed count
    Count(usize),
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` features
    pub fn resolve(&self, n_features: usize) -> usize {
        let count = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Fraction(f) => (f * n_features as f64) as usize,
            MaxFeatures::Count(c) => c,
        };
        count.clamp(1, n_features.max(1))
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may be split
    pub min_samples_split: usize,
    /// Minimum rows each leaf must keep
    pub min_samples_leaf: usize,
    /// Split candidates per node
    pub max_features: MaxFeatures,
    /// Grow each tree on a bootstrap sample instead of all rows
    pub bootstrap: bool,
    /// Seed for bootstrap sampling and feature draws
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: Some(20),
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: MaxFeatures::All,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Check hyperparameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forest needs at least one tree".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "Maximum depth must be greater than zero".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        match self.max_features {
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(ForecastError::InvalidParameter(
                    "max_features fraction must be in (0, 1]".to_string(),
                ));
            }
            MaxFeatures::Count(0) => {
                return Err(ForecastError::InvalidParameter(
                    "max_features count must be at least 1".to_string(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Unfitted random forest
#[derive(Debug, Clone)]
pub struct RandomForest {
    /// Name of the model
    name: String,
    config: ForestConfig,
}

impl RandomForest {
    /// Create a new random forest with validated hyperparameters
    pub fn new(config: ForestConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            name: format!("Random Forest ({} trees)", config.n_trees),
            config,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl Regressor for RandomForest {
    type Fitted = FittedForest;

    fn fit(&self, x: &Matrix, y: &[f64]) -> Result<Self::Fitted> {
        check_training_data(x, y)?;

        let n_rows = x.n_rows();
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(x.n_cols()),
        };

        // Seeds are drawn up front so tree i always sees the same stream
        let mut master = StdRng::seed_from_u64(self.config.seed);
        let tree_seeds: Vec<u64> = (0..self.config.n_trees).map(|_| master.gen()).collect();
        let bootstrap = self.config.bootstrap;

        let trees: Vec<RegressionTree> = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let sample: Vec<usize> = if bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                RegressionTree::fit(x, y, &sample, &tree_config, &mut rng)
            })
            .collect();

        debug!(
            "Fitted {} trees on {} rows x {} features (max depth reached: {})",
            trees.len(),
            n_rows,
            x.n_cols(),
            trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
        );

        Ok(FittedForest {
            name: self.name.clone(),
            config: self.config.clone(),
            n_features: x.n_cols(),
            trees,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Trained random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedForest {
    /// Name of the model
    name: String,
    config: ForestConfig,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl FittedForest {
    /// Hyperparameters the forest was grown with
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl FittedRegressor for FittedForest {
    fn predict(&self, x: &Matrix) -> Result<Vec<f64>> {
        check_feature_count(x, self.n_features)?;
        if self.trees.is_empty() {
            return Err(ForecastError::ModelError("forest has no trees".to_string()));
        }

        let n_trees = self.trees.len() as f64;
        let predictions = (0..x.n_rows())
            .map(|i| {
                let row = x.row(i);
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees
            })
            .collect();

        Ok(predictions)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (total, value) in totals.iter_mut().zip(tree.feature_importances()) {
                *total += value;
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum <= 0.0 {
            return Some(totals);
        }
        Some(totals.into_iter().map(|v| v / sum).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(ForecastError::ModelError("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(ForecastError::ModelError(format!(
                    "tree {} has {} features, forest has {}",
                    i,
                    tree.n_features(),
                    self.n_features
                )));
            }
            tree.validate().map_err(|e| match e {
                ForecastError::ModelError(msg) => {
                    ForecastError::ModelError(format!("tree {}: {}", i, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> ForestConfig {
        ForestConfig {
            n_trees: 12,
            max_depth: Some(6),
            seed,
            ..ForestConfig::default()
        }
    }

    fn sine_data(n: usize) -> (Matrix, Vec<f64>) {
        let rows: Vec<[f64; 2]> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                [t, (i % 7) as f64]
            })
            .collect();
        let y = (0..n)
            .map(|i| 8.0 + 4.0 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).sin())
            .collect();
        (Matrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn test_default_config_matches_documented_values() {
        let config = ForestConfig::default();
        assert_eq!(config.n_trees, 200);
        assert_eq!(config.max_depth, Some(20));
        assert_eq!(config.min_samples_split, 5);
        assert_eq!(config.min_samples_leaf, 2);
        assert_eq!(config.max_features, MaxFeatures::All);
        assert!(config.bootstrap);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let no_trees = ForestConfig {
            n_trees: 0,
            ..ForestConfig::default()
        };
        assert!(RandomForest::new(no_trees).is_err());

        let bad_fraction = ForestConfig {
            max_features: MaxFeatures::Fraction(1.5),
            ..ForestConfig::default()
        };
        assert!(RandomForest::new(bad_fraction).is_err());
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::All.resolve(8), 8);
        assert_eq!(MaxFeatures::Sqrt.resolve(8), 2);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(8), 4);
        assert_eq!(MaxFeatures::Count(20).resolve(8), 8);
        assert_eq!(MaxFeatures::Fraction(0.01).resolve(8), 1);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = sine_data(200);
        let a = RandomForest::new(small_config(9)).unwrap().fit(&x, &y).unwrap();
        let b = RandomForest::new(small_config(9)).unwrap().fit(&x, &y).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_forest_fits_smooth_signal() {
        let (x, y) = sine_data(300);
        let forest = RandomForest::new(small_config(42)).unwrap().fit(&x, &y).unwrap();
        let predictions = forest.predict(&x).unwrap();

        let mae = level_math::metrics::mean_absolute_error(&y, &predictions).unwrap();
        assert!(mae < 0.5, "training MAE too high: {}", mae);
        assert_eq!(forest.n_trees(), 12);
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (x, y) = sine_data(200);
        let forest = RandomForest::new(small_config(5)).unwrap().fit(&x, &y).unwrap();
        let importances = forest.feature_importances().unwrap();

        assert_eq!(importances.len(), 2);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // The signal lives in the first column
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let (x, y) = sine_data(50);
        let forest = RandomForest::new(small_config(1)).unwrap().fit(&x, &y).unwrap();
        let narrow = Matrix::from_rows(&[[0.5]]).unwrap();
        assert!(forest.predict(&narrow).is_err());
    }

    #[test]
    fn test_fit_rejects_mismatched_targets() {
        let (x, _) = sine_data(20);
        let model = RandomForest::new(small_config(1)).unwrap();
        assert!(model.fit(&x, &[1.0; 5]).is_err());
    }
}
