//! # River Forecast
//!
//! Daily river-level forecasting from a history of monthly readings.
//!
//! ## Features
//!
//! - Loading and validating the historical JSON corpus
//! - Seasonal date features with a versioned schema
//! - Random forest regression with seeded, parallel tree growth
//! - Held-out evaluation (MAE, RMSE, R²) and feature importances
//! - Single-day and whole-month prediction with level categories
//! - Outlier and daily-variation screening of the corpus
//!
//! ## Quick Start
//!
//! ```no_run
//! use river_forecast::data::{DataLoader, DuplicatePolicy};
//! use river_forecast::models::ForestConfig;
//! use river_forecast::prediction::PredictionService;
//! use river_forecast::training::{TrainingConfig, TrainingPipeline};
//!
//! # fn main() -> river_forecast::Result<()> {
//! let path = "dados_nivel_rios_itacoatiara.json";
//! let dataset = DataLoader::from_json_file(path, DuplicatePolicy::LastWins)?;
//!
//! let pipeline =
//!     TrainingPipeline::random_forest(ForestConfig::default(), TrainingConfig::default())?;
//! let (model, report) = pipeline.train(&dataset)?;
//! println!("{}", report);
//! model.save("modelo_nivel_rio.pkl")?;
//!
//! let service = PredictionService::new();
//! let day = service.predict_day(&model, 2025, 10, 3)?;
//! println!("{}: {:.2} m ({})", day.date, day.level, day.category);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod fitted_model;
pub mod models;
pub mod prediction;
pub mod training;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::data::{DataLoader, DuplicatePolicy, HistoricalDataset, MonthlyRecord, Observation};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureEncoder, FeatureSchema, FeatureVector};
pub use crate::fitted_model::FittedModel;
pub use crate::models::{FittedRegressor, Regressor};
pub use crate::prediction::{
    Clock, FixedClock, LevelCategory, PredictedLevel, PredictionService, SystemClock,
};
pub use crate::training::{EvaluationReport, TrainingConfig, TrainingPipeline};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
