//! # River Stage
//!
//! Facade over the river level forecasting workspace.
//!
//! - [`forecast`]: data loading, feature encoding, training and prediction
//! - [`math`]: error metrics and descriptive statistics
//!
//! ## Example
//!
//! ```no_run
//! use river_stage_workspace::forecast::models::ForestConfig;
//! use river_stage_workspace::forecast::{
//!     DataLoader, DuplicatePolicy, PredictionService, TrainingConfig, TrainingPipeline,
//! };
//!
//! # fn main() -> river_stage_workspace::forecast::Result<()> {
//! let path = "dados_nivel_rios_itacoatiara.json";
//! let dataset = DataLoader::from_json_file(path, DuplicatePolicy::default())?;
//! let pipeline =
//!     TrainingPipeline::random_forest(ForestConfig::default(), TrainingConfig::default())?;
//! let (model, _report) = pipeline.train(&dataset)?;
//!
//! for day in PredictionService::new().predict_month(&model, 2025, 11)? {
//!     println!("{} {:.2} m", day.date, day.level);
//! }
//! # Ok(())
//! # }
//! ```

pub use level_math as math;
pub use river_forecast as forecast;

/// Workspace version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facade_exposes_members() {
        assert_eq!(forecast::NAME, "river_forecast");
        assert_eq!(math::metrics::mean_absolute_error(&[1.0], &[2.0]).unwrap(), 1.0);
        assert!(!VERSION.is_empty());
    }
}
