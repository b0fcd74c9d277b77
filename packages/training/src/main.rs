#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trains the four incident models and writes their artifacts.

use std::path::PathBuf;

use clap::Parser;
use incident_predict_cli_utils::IndicatifProgress;
use incident_predict_store::paths;
use incident_predict_training::{ModelKind, TrainingConfig, run_and_save};

#[derive(Parser)]
#[command(name = "incident_predict_training", about = "Incident model training")]
struct Cli {
    /// NDJSON corpus to train on (defaults to `$INCIDENT_DATA` or
    /// `data/incidents.ndjson`)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory to write artifacts into (defaults to
    /// `$INCIDENT_ARTIFACTS` or `data/models`)
    #[arg(long)]
    output: Option<PathBuf>,

    /// TOML file with per-model hyper-parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed applied to every model
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = incident_predict_cli_utils::init_logger();
    let cli = Cli::parse();

    let data = cli.data.unwrap_or_else(paths::corpus_path_from_env);
    let output = cli.output.unwrap_or_else(paths::artifacts_dir_from_env);

    let mut config = match &cli.config {
        Some(path) => TrainingConfig::load(path)?,
        None => TrainingConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let progress =
        IndicatifProgress::stages_bar(&multi, "Training", ModelKind::ALL.len() as u64);
    let artifacts = run_and_save(&data, &output, &config, &progress)?;

    log::info!(
        "Done: {} groups, {} regions, {} reports. Artifacts in {}",
        artifacts.encoders.group.len(),
        artifacts.encoders.region.len(),
        artifacts.encoders.report.len(),
        output.display()
    );

    Ok(())
}
