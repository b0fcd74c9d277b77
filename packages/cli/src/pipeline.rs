//! Full pipeline orchestrator for the incident predict toolchain.
//!
//! Chains generate -> train -> serve in a single interactive flow. Every
//! step reads the paths the previous one wrote, taken from
//! `INCIDENT_DATA` / `INCIDENT_ARTIFACTS` or the `data/` defaults.

use std::time::Instant;

use dialoguer::{Confirm, MultiSelect};
use incident_predict_cli_utils::{IndicatifProgress, MultiProgress, prompt_value};
use incident_predict_generate::{DEFAULT_COUNT, GenerateArgs};
use incident_predict_store::paths;
use incident_predict_training::{ModelKind, TrainingConfig};

/// Steps available in the pipeline.
enum PipelineStep {
    Generate,
    Train,
    Serve,
}

impl PipelineStep {
    const ALL: &[Self] = &[Self::Generate, Self::Train, Self::Serve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Generate => "Generate synthetic corpus",
            Self::Train => "Train models",
            Self::Serve => "Start server",
        }
    }
}

/// Runs the selected pipeline steps in order.
///
/// A failing step stops the pipeline; later steps would only read stale or
/// missing inputs.
///
/// # Errors
///
/// Returns an error if a prompt or a step fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline_start = Instant::now();

    let labels: Vec<&str> = PipelineStep::ALL.iter().map(PipelineStep::label).collect();
    let selected = MultiSelect::new()
        .with_prompt("Steps to run (space to toggle)")
        .items(&labels)
        .defaults(&[true, true, false])
        .interact()?;

    if selected.is_empty() {
        println!("Nothing selected.");
        return Ok(());
    }

    let data = paths::corpus_path_from_env();
    let artifacts = paths::artifacts_dir_from_env();
    let seed: u64 = prompt_value("Seed", 42)?;

    let generate = selected.contains(&0);
    let count: u64 = if generate {
        prompt_value("Number of incidents", DEFAULT_COUNT)?
    } else {
        0
    };

    let total_steps = selected.len();
    let mut current_step = 0;

    if generate {
        current_step += 1;
        log::info!("[{current_step}/{total_steps}] Generating corpus...");
        let args = GenerateArgs {
            count,
            seed,
            output: data.clone(),
        };
        let progress = IndicatifProgress::records_bar(multi, "Generating incidents");
        incident_predict_generate::run(&args, &progress)?;
    }

    if selected.contains(&1) {
        current_step += 1;
        log::info!("[{current_step}/{total_steps}] Training models...");
        let config = TrainingConfig::default().with_seed(seed);
        let progress =
            IndicatifProgress::stages_bar(multi, "Training", ModelKind::ALL.len() as u64);
        incident_predict_training::run_and_save(&data, &artifacts, &config, &progress)?;
    }

    let elapsed = pipeline_start.elapsed();
    log::info!("Pipeline complete in {:.1}s", elapsed.as_secs_f64());

    if selected.contains(&2) {
        current_step += 1;
        log::info!("[{current_step}/{total_steps}] Starting server...");
        if Confirm::new()
            .with_prompt("Start the server now?")
            .default(true)
            .interact()?
        {
            crate::serve(false)?;
        }
    }

    Ok(())
}
