#![allow(dead_code)]

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use river_forecast::calendar::days_in_month;
use river_forecast::models::ForestConfig;
use river_forecast::{
    DuplicatePolicy, FittedModel, HistoricalDataset, MonthlyRecord, TrainingConfig,
    TrainingPipeline,
};

/// Smooth annual cycle around 8 m
pub fn seasonal_level(date: NaiveDate) -> f64 {
    use chrono::Datelike;
    let angle = 2.0 * std::f64::consts::PI * date.ordinal() as f64 / 365.25;
    8.0 + 5.0 * angle.sin()
}

/// Monthly records for `years`, following [`seasonal_level`] plus
/// Gaussian noise with standard deviation `noise`
pub fn synthetic_dataset(
    years: std::ops::RangeInclusive<i32>,
    noise: f64,
    seed: u64,
) -> HistoricalDataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, noise.max(f64::MIN_POSITIVE)).unwrap();

    let mut records = Vec::new();
    for year in years {
        for month in 1..=12u32 {
            let days = days_in_month(year, month).unwrap();
            let levels = (1..=days)
                .map(|day| {
                    let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
                    let jitter = if noise > 0.0 { normal.sample(&mut rng) } else { 0.0 };
                    seasonal_level(date) + jitter
                })
                .collect();
            records.push(MonthlyRecord::new(year, month as i32, levels).unwrap());
        }
    }

    HistoricalDataset::from_records(records, DuplicatePolicy::Reject).unwrap()
}

/// Forest small enough for debug-mode tests
pub fn small_forest(seed: u64) -> ForestConfig {
    ForestConfig {
        n_trees: 10,
        max_depth: Some(8),
        seed,
        ..ForestConfig::default()
    }
}

pub fn trained_model() -> FittedModel {
    let dataset = synthetic_dataset(2020..=2021, 0.2, 11);
    let pipeline =
        TrainingPipeline::random_forest(small_forest(42), TrainingConfig::default()).unwrap();
    pipeline.train(&dataset).unwrap().0
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
