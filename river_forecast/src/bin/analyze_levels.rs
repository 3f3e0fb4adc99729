//! Screen the historical corpus for outliers and abrupt daily changes

use anyhow::Context;
use clap::Parser;
use river_forecast::analysis::{find_daily_variations, find_outliers, summarize_dataset};
use river_forecast::{AppConfig, DataLoader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "analyze_levels")]
#[command(about = "Report outliers and large daily variations in level data", long_about = None)]
struct Cli {
    /// Historical data file (JSON)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// |z| above which a reading is an outlier
    #[arg(long)]
    z_threshold: Option<f64>,

    /// Day-to-day change (m) above which a variation is reported
    #[arg(long)]
    variation_threshold: Option<f64>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(input) = cli.input {
        config.data.path = input;
    }
    if let Some(z) = cli.z_threshold {
        config.analysis.z_threshold = z;
    }
    if let Some(threshold) = cli.variation_threshold {
        config.analysis.variation_threshold = threshold;
    }
    config.validate()?;

    let dataset = DataLoader::from_json_file(&config.data.path, config.data.duplicate_policy)
        .with_context(|| format!("Failed to load {}", config.data.path.display()))?;
    let analysis = &config.analysis;

    println!("{}", summarize_dataset(&dataset)?);

    let outliers = find_outliers(&dataset, analysis.z_threshold)?;
    println!();
    println!(
        "Outliers (|z| > {}): {} found",
        analysis.z_threshold,
        outliers.len()
    );
    for outlier in outliers.iter().take(analysis.max_outliers) {
        println!(
            "  {}  {:>7.2} m  z = {:+.2}",
            outlier.date.format("%d/%m/%Y"),
            outlier.level,
            outlier.z_score
        );
    }

    let variations = find_daily_variations(&dataset, analysis.variation_threshold);
    println!();
    println!(
        "Daily variations above {} m: {} found",
        analysis.variation_threshold,
        variations.len()
    );
    for v in variations.iter().take(analysis.max_variations) {
        println!(
            "  {} -> {}  {:.2} m -> {:.2} m  ({:+.2} m)",
            v.from_date.format("%d/%m/%Y"),
            v.to_date.format("%d/%m/%Y"),
            v.from_level,
            v.to_level,
            v.delta()
        );
    }

    Ok(())
}
