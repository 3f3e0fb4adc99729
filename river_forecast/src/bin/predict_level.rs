//! Predict the river level for a day or a month

use anyhow::Context;
use clap::Parser;
use river_forecast::prediction::write_csv_file;
use river_forecast::{AppConfig, FittedModel, LevelCategory, PredictedLevel, PredictionService};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "predict_level")]
#[command(about = "Predict the river level for a date or a whole month", long_about = None)]
struct Cli {
    /// Year (e.g. 2025)
    year: i32,

    /// Month (1-12)
    month: i32,

    /// Day of month; omit to predict the whole month
    day: Option<i32>,

    /// Model artifact
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the predictions to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Show features and model details
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn emoji(category: LevelCategory) -> &'static str {
    match category {
        LevelCategory::VeryLow => "⚠️",
        LevelCategory::Low => "📉",
        LevelCategory::Normal => "✅",
        LevelCategory::High => "📈",
        LevelCategory::VeryHigh => "🚨",
    }
}

fn print_day(prediction: &PredictedLevel, model: &FittedModel, verbose: bool) {
    println!("{}", "=".repeat(50));
    println!("RIVER LEVEL FORECAST");
    println!("{}", "=".repeat(50));
    println!(
        "Date: {} ({})",
        prediction.date.format("%d/%m/%Y"),
        prediction.weekday
    );
    println!("Season: {}", prediction.season);
    println!("Predicted level: {:.2} m", prediction.level);
    println!("Category: {} {}", prediction.category, emoji(prediction.category));

    if verbose {
        println!();
        println!("Details:");
        println!("  - Day of year: {}", prediction.day_of_year());
        println!("  - Features ({}):", model.schema());
        for (name, value) in prediction.features.named_values() {
            println!("    {}: {:.3}", name, value);
        }
        println!(
            "  - Model: random forest with {} trees, trained on {} to {}",
            model.regressor().n_trees(),
            model.span().start,
            model.span().end
        );
    }
    println!("{}", "=".repeat(50));

    for warning in &prediction.warnings {
        println!("⚠️  Warning: {}", warning);
    }
}

fn print_month(predictions: &[PredictedLevel], year: i32, month: i32) {
    println!("{}", "=".repeat(60));
    println!("RIVER LEVEL FORECAST FOR {:02}/{}", month, year);
    println!("{}", "=".repeat(60));
    for p in predictions {
        println!(
            "{} ({}): {:.2}m - {} {}",
            p.date.format("%d/%m/%Y"),
            p.weekday,
            p.level,
            p.category,
            emoji(p.category)
        );
    }
    println!("{}", "=".repeat(60));

    let mut warnings: Vec<String> = predictions
        .iter()
        .flat_map(|p| p.warnings.iter().map(|w| w.to_string()))
        .collect();
    warnings.sort();
    warnings.dedup();
    for warning in warnings {
        println!("⚠️  Warning: {}", warning);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if !(1900..=2100).contains(&cli.year) {
        eprintln!(
            "Warning: year {} is outside the typical range (1900-2100)",
            cli.year
        );
    }

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let model_path = cli.model.unwrap_or(config.model.path);

    let model: FittedModel = FittedModel::load(&model_path)
        .with_context(|| format!("Run train_model first to create {}", model_path.display()))?;
    let service = PredictionService::new();

    let predictions = match cli.day {
        Some(day) => {
            let prediction = service.predict_day(&model, cli.year, cli.month, day)?;
            print_day(&prediction, &model, cli.verbose > 0);
            vec![prediction]
        }
        None => {
            let predictions = service.predict_month(&model, cli.year, cli.month)?;
            print_month(&predictions, cli.year, cli.month);
            predictions
        }
    };

    if let Some(csv_path) = cli.csv {
        write_csv_file(&predictions, &csv_path)
            .with_context(|| format!("Failed to write {}", csv_path.display()))?;
        println!("Predictions written to {}", csv_path.display());
    }

    Ok(())
}
