#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive CLI orchestrator for the incident predict toolchain.
//!
//! Lets users pick which tool to run (generate, train, serve, or the whole
//! pipeline) and guides them through the configuration for each.
//!
//! Uses `indicatif-log-bridge` (via
//! [`incident_predict_cli_utils::init_logger`]) to route `log` output
//! through `indicatif::MultiProgress` so that log lines and progress bars
//! never fight for the terminal.

mod pipeline;

use dialoguer::Select;

/// Top-level tool selection.
enum Tool {
    RunPipeline,
    Generate,
    Train,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::RunPipeline, Self::Generate, Self::Train, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunPipeline => "Run full pipeline",
            Self::Generate => "Generate synthetic corpus",
            Self::Train => "Train models",
            Self::Server => "Start server",
        }
    }
}

/// Runs the API server on its own actix system, optionally prompting for
/// its configuration first.
fn serve(interactive: bool) -> std::io::Result<()> {
    actix_web::rt::System::new().block_on(async move {
        if interactive {
            incident_predict_server::interactive::run().await
        } else {
            incident_predict_server::run_server().await
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = incident_predict_cli_utils::init_logger();

    println!("Incident Predict Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::RunPipeline => pipeline::run(&multi)?,
        Tool::Generate => {
            incident_predict_generate::interactive::run_interactive(&multi)?;
        }
        Tool::Train => incident_predict_training::interactive::run_interactive(&multi)?,
        Tool::Server => serve(true)?,
    }

    Ok(())
}
