//! Interactive prompts for the generator.
//!
//! Asks for the record count, seed and output file with `dialoguer`
//! instead of CLI flags, then runs the generator.

use dialoguer::Confirm;
use incident_predict_cli_utils::{IndicatifProgress, MultiProgress, prompt_path, prompt_value};
use incident_predict_store::paths;

use crate::{DEFAULT_COUNT, GenerateArgs, run};

/// Prompts for generation parameters and runs the generator.
///
/// Returns `Ok(false)` without writing anything if the user declines to
/// overwrite an existing corpus.
///
/// # Errors
///
/// Returns an error if a prompt fails or generation fails.
pub fn run_interactive(multi: &MultiProgress) -> Result<bool, Box<dyn std::error::Error>> {
    let count: u64 = prompt_value("Number of incidents", DEFAULT_COUNT)?;
    let seed: u64 = prompt_value("Seed", rand::random::<u32>().into())?;
    let output = prompt_path("Output file", &paths::corpus_path_from_env())?;

    if output.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} exists. Replace it?", output.display()))
            .default(true)
            .interact()?;
        if !overwrite {
            log::info!("Generation cancelled");
            return Ok(false);
        }
    }

    let args = GenerateArgs {
        count,
        seed,
        output,
    };
    let progress = IndicatifProgress::records_bar(multi, "Generating incidents");
    run(&args, &progress)?;

    Ok(true)
}
