//! Interactive prompts for a training run.

use dialoguer::Confirm;
use incident_predict_cli_utils::{IndicatifProgress, MultiProgress, prompt_path, prompt_value};
use incident_predict_store::paths;

use crate::{ModelKind, TrainingConfig, run_and_save};

/// Prompts for the corpus, output directory, optional hyper-parameter file
/// and seed, then trains and saves every model.
///
/// # Errors
///
/// Returns an error if a prompt fails, the config file is invalid, or
/// training fails.
pub fn run_interactive(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let data = prompt_path("Incident corpus", &paths::corpus_path_from_env())?;
    let output = prompt_path("Artifacts directory", &paths::artifacts_dir_from_env())?;

    let mut config = if Confirm::new()
        .with_prompt("Load hyper-parameters from a TOML file?")
        .default(false)
        .interact()?
    {
        let path = prompt_path("Config file", &paths::project_root().join("training.toml"))?;
        TrainingConfig::load(&path)?
    } else {
        TrainingConfig::default()
    };

    let seed: u64 = prompt_value("Seed", 42)?;
    config = config.with_seed(seed);

    let progress =
        IndicatifProgress::stages_bar(multi, "Training", ModelKind::ALL.len() as u64);
    run_and_save(&data, &output, &config, &progress)?;

    log::info!("Artifacts written to {}", output.display());
    Ok(())
}
