//! Trained model bundle and its on-disk artifact
//!
//! A [`FittedModel`] couples a fitted regressor with the feature schema it
//! was trained under and the date span of its training data. It is written
//! once after training and only read afterwards.

use crate::error::{ForecastError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use crate::models::{FittedForest, FittedRegressor, Matrix};
use chrono::NaiveDate;
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Version of the artifact layout written by [`FittedModel::save`]
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Dates covered by the training data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Number of observations in the full dataset, before the split
    pub observations: usize,
}

/// A trained regressor bundled with its feature contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel<R = FittedForest> {
    format_version: u32,
    schema: FeatureSchema,
    span: TrainingSpan,
    regressor: R,
}

impl<R: FittedRegressor> FittedModel<R> {
    pub fn new(schema: FeatureSchema, span: TrainingSpan, regressor: R) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            schema,
            span,
            regressor,
        }
    }

    /// Feature schema the regressor was fitted under
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn span(&self) -> &TrainingSpan {
        &self.span
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// Predict one level per feature vector
    pub fn predict_features(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        let rows: Vec<_> = features.iter().map(FeatureVector::to_array).collect();
        let x = Matrix::from_rows(&rows)?;
        if x.is_empty() {
            return Ok(Vec::new());
        }
        self.regressor.predict(&x)
    }
}

impl<R: FittedRegressor + Serialize> FittedModel<R> {
    /// Write the artifact as JSON
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Write the artifact to `path`, replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;

        info!("Saved {} to {}", self.regressor.name(), path.display());
        Ok(())
    }
}

impl<R: FittedRegressor + DeserializeOwned> FittedModel<R> {
    /// Read an artifact. `source` names the origin in error messages.
    pub fn from_reader<S: Read>(reader: S, source: &str) -> Result<Self> {
        let model: Self =
            serde_json::from_reader(reader).map_err(|e| ForecastError::ModelLoad {
                path: source.to_string(),
                reason: e.to_string(),
            })?;

        if model.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ForecastError::ModelLoad {
                path: source.to_string(),
                reason: format!(
                    "unsupported artifact version {} (expected {})",
                    model.format_version, ARTIFACT_FORMAT_VERSION
                ),
            });
        }
        if model.regressor.n_features() != model.schema.len() {
            return Err(ForecastError::ModelLoad {
                path: source.to_string(),
                reason: format!(
                    "regressor expects {} features but schema {} lists {}",
                    model.regressor.n_features(),
                    model.schema,
                    model.schema.len()
                ),
            });
        }

        model
            .regressor
            .validate()
            .map_err(|e| ForecastError::ModelLoad {
                path: source.to_string(),
                reason: e.to_string(),
            })?;

        Ok(model)
    }

    /// Read the artifact at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ForecastError::ModelLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let model = Self::from_reader(BufReader::new(file), &path.display().to_string())?;

        info!(
            "Loaded {} ({}) from {}",
            model.regressor.name(),
            model.schema,
            path.display()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ForestConfig, RandomForest, Regressor};

    fn tiny_model() -> FittedModel {
        let schema = FeatureSchema::seasonal_v1();
        let rows: Vec<[f64; 8]> = (0..12)
            .map(|i| {
                let v = i as f64;
                [2020.0, v, v, v, 0.0, 0.0, 0.0, 0.0]
            })
            .collect();
        let y: Vec<f64> = (0..12).map(|i| i as f64 * 0.5).collect();
        let forest = RandomForest::new(ForestConfig {
            n_trees: 3,
            ..ForestConfig::default()
        })
        .unwrap()
        .fit(&Matrix::from_rows(&rows).unwrap(), &y)
        .unwrap();

        let span = TrainingSpan {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 1, 12).unwrap(),
            observations: 12,
        };
        FittedModel::new(schema, span, forest)
    }

    #[test]
    fn test_round_trip_through_buffer() {
        let model = tiny_model();
        let mut buffer = Vec::new();
        model.to_writer(&mut buffer).unwrap();

        let restored: FittedModel = FittedModel::from_reader(buffer.as_slice(), "buffer").unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn test_garbage_is_a_load_error() {
        let result: Result<FittedModel> = FittedModel::from_reader(&b"not json"[..], "buffer");
        assert!(matches!(result, Err(ForecastError::ModelLoad { .. })));
    }

    #[test]
    fn test_wrong_format_version_rejected() {
        let mut model = tiny_model();
        model.format_version = ARTIFACT_FORMAT_VERSION + 1;
        let mut buffer = Vec::new();
        model.to_writer(&mut buffer).unwrap();

        let result: Result<FittedModel> = FittedModel::from_reader(buffer.as_slice(), "buffer");
        match result {
            Err(ForecastError::ModelLoad { reason, .. }) => assert!(reason.contains("version")),
            other => panic!("expected ModelLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_predict_features_empty_input() {
        let model = tiny_model();
        assert!(model.predict_features(&[]).unwrap().is_empty());
    }
}
