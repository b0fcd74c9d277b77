#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Generates a synthetic incident corpus and replaces the document store.

use std::path::PathBuf;

use clap::Parser;
use incident_predict_cli_utils::IndicatifProgress;
use incident_predict_generate::{DEFAULT_COUNT, GenerateArgs, run};
use incident_predict_store::paths;

#[derive(Parser)]
#[command(name = "incident_predict_generate", about = "Synthetic incident generator")]
struct Cli {
    /// Number of incidents to generate
    #[arg(long, default_value_t = DEFAULT_COUNT)]
    count: u64,

    /// RNG seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// NDJSON file to replace (defaults to `$INCIDENT_DATA` or
    /// `data/incidents.ndjson`)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = incident_predict_cli_utils::init_logger();
    let cli = Cli::parse();

    let args = GenerateArgs {
        count: cli.count,
        seed: cli.seed.unwrap_or_else(rand::random),
        output: cli.output.unwrap_or_else(paths::corpus_path_from_env),
    };

    let progress = IndicatifProgress::records_bar(&multi, "Generating incidents");
    run(&args, &progress)?;

    Ok(())
}
