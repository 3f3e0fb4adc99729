//! Train the river level model
//!
//! Loads the historical corpus, fits a random forest, prints the held-out
//! evaluation and writes the model artifact.

use anyhow::Context;
use clap::Parser;
use log::info;
use river_forecast::analysis::summarize_dataset;
use river_forecast::{AppConfig, DataLoader, TrainingPipeline};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "train_model")]
#[command(about = "Train a river level forecasting model", long_about = None)]
struct Cli {
    /// Historical data file (JSON)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the model artifact
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for both the split and the forest
    #[arg(long)]
    seed: Option<u64>,

    /// Number of trees
    #[arg(long)]
    trees: Option<usize>,

    /// Also write the evaluation report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(input) = cli.input {
        config.data.path = input;
    }
    if let Some(output) = cli.output {
        config.model.path = output;
    }
    if let Some(seed) = cli.seed {
        config.training.seed = seed;
        config.forest.seed = seed;
    }
    if let Some(trees) = cli.trees {
        config.forest.n_trees = trees;
    }
    config.validate()?;

    let dataset = DataLoader::from_json_file(&config.data.path, config.data.duplicate_policy)
        .with_context(|| format!("Failed to load {}", config.data.path.display()))?;

    let summary = summarize_dataset(&dataset)?;
    println!("{}", summary);
    println!();

    let pipeline = TrainingPipeline::random_forest(config.forest.clone(), config.training.clone())?;
    info!(
        "Training with {} trees, test ratio {}",
        config.forest.n_trees, config.training.test_ratio
    );
    let (model, report) = pipeline.train(&dataset).context("Training failed")?;

    println!("{}", "=".repeat(50));
    println!("MODEL EVALUATION");
    println!("{}", "=".repeat(50));
    println!("{}", report);
    println!("{}", "=".repeat(50));

    model
        .save(&config.model.path)
        .with_context(|| format!("Failed to write {}", config.model.path.display()))?;
    println!("Model saved to {}", config.model.path.display());

    if let Some(report_path) = cli.report {
        let writer = BufWriter::new(
            File::create(&report_path)
                .with_context(|| format!("Failed to create {}", report_path.display()))?,
        );
        serde_json::to_writer_pretty(writer, &report)?;
        println!("Report written to {}", report_path.display());
    }

    Ok(())
}
