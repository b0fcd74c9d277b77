//! Interactive mode for the server.
//!
//! Prompts for the bind address, port, and input locations before starting
//! the server.

use dialoguer::{Confirm, Input};
use incident_predict_store::paths;

use crate::{DEFAULT_BIND_ADDR, DEFAULT_PORT};

fn prompt(label: &str, default: String) -> String {
    Input::new()
        .with_prompt(label)
        .default(default.clone())
        .interact_text()
        .unwrap_or(default)
}

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `BIND_ADDR`, `PORT`, `INCIDENT_DATA` and `INCIDENT_ARTIFACTS` from
/// the answers and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Incident Predict Server");
    println!();

    let bind_addr = prompt("Bind address", DEFAULT_BIND_ADDR.to_string());
    let port = prompt("Port", DEFAULT_PORT.to_string());
    let data = prompt(
        "Incident corpus",
        paths::corpus_path_from_env().display().to_string(),
    );
    let artifacts = prompt(
        "Model artifacts directory",
        paths::artifacts_dir_from_env().display().to_string(),
    );

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port);
        std::env::set_var(paths::DATA_PATH_ENV, &data);
        std::env::set_var(paths::ARTIFACTS_DIR_ENV, &artifacts);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
