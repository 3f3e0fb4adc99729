//! Regression models
//!
//! Models follow a two-stage contract. A [`Regressor`] holds hyperparameters
//! and fits on a feature [`Matrix`] and target vector, producing a
//! [`FittedRegressor`] that only predicts. Feature encoding and prediction
//! code depend on these traits, never on a concrete model.

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

pub mod random_forest;
pub mod tree;

pub use random_forest::{FittedForest, ForestConfig, MaxFeatures, RandomForest};
pub use tree::{RegressionTree, TreeConfig};

/// Dense row-major matrix of feature values
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a matrix from row-major data
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows * cols != data.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Matrix of {}x{} needs {} values, got {}",
                rows,
                cols,
                rows * cols,
                data.len()
            )));
        }

        Ok(Self { rows, cols, data })
    }

    /// Create a matrix from equally sized rows
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(ForecastError::InvalidParameter(format!(
                    "Row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    cols
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// One row as a slice
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Single cell
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Copy the given rows, in the given order, into a new matrix
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }

        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }
}

/// A trained model that maps feature rows to predictions
pub trait FittedRegressor: Debug + Send + Sync {
    /// Predict one value per row of `x`
    fn predict(&self, x: &Matrix) -> Result<Vec<f64>>;

    /// Number of features the model was fitted on
    fn n_features(&self) -> usize;

    /// Relative importance of each feature, summing to 1, if the model
    /// can report it
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    /// Name of the model
    fn name(&self) -> &str;

    /// Check the internal structure of a model read back from storage
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Predict a single row
    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let x = Matrix::new(1, row.len(), row.to_vec())?;
        self.predict(&x)?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::ModelError("model returned no prediction".to_string()))
    }
}

/// Model configuration that can be fitted on a feature matrix
pub trait Regressor: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedRegressor;

    /// Fit the model on rows of `x` against targets `y`
    fn fit(&self, x: &Matrix, y: &[f64]) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Shared input check for [`FittedRegressor::predict`] implementations
pub(crate) fn check_feature_count(x: &Matrix, expected: usize) -> Result<()> {
    if x.n_cols() != expected {
        return Err(ForecastError::ModelError(format!(
            "model was fitted on {} features, got {}",
            expected,
            x.n_cols()
        )));
    }
    Ok(())
}

/// Shared input check for [`Regressor::fit`] implementations
pub(crate) fn check_training_data(x: &Matrix, y: &[f64]) -> Result<()> {
    if x.is_empty() || y.is_empty() {
        return Err(ForecastError::ModelError(
            "cannot fit on an empty training set".to_string(),
        ));
    }
    if x.n_rows() != y.len() {
        return Err(ForecastError::ModelError(format!(
            "feature matrix has {} rows but {} targets were given",
            x.n_rows(),
            y.len()
        )));
    }
    Ok(())
}
