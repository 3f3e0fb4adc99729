//! Train on a synthetic seasonal series and forecast a month.
//!
//! Run with `cargo run --example seasonal_forecast`.

use river_stage_workspace::forecast::calendar::days_in_month;
use river_stage_workspace::forecast::models::ForestConfig;
use river_stage_workspace::forecast::{
    DuplicatePolicy, HistoricalDataset, MonthlyRecord, PredictionService, TrainingConfig,
    TrainingPipeline,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Three years of a clean annual cycle: low water in spring, flood in autumn
    let mut records = Vec::new();
    for year in 2021..=2023 {
        for month in 1..=12u32 {
            let days = days_in_month(year, month).ok_or("bad month")?;
            let levels = (0..days)
                .map(|d| {
                    let t = (month as f64 - 1.0) / 12.0 + d as f64 / 365.0;
                    9.0 + 6.0 * (2.0 * std::f64::consts::PI * t).sin()
                })
                .collect();
            records.push(MonthlyRecord::new(year, month as i32, levels)?);
        }
    }
    let dataset = HistoricalDataset::from_records(records, DuplicatePolicy::Reject)?;

    let forest = ForestConfig {
        n_trees: 50,
        ..ForestConfig::default()
    };
    let pipeline = TrainingPipeline::random_forest(forest, TrainingConfig::default())?;
    let (model, report) = pipeline.train(&dataset)?;
    println!("{}\n", report);

    let service = PredictionService::new();
    for day in service.predict_month(&model, 2024, 4)? {
        println!(
            "{} {:<9} {:>6.2} m  {}",
            day.date, day.season, day.level, day.category
        );
    }

    Ok(())
}
