#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident predict API server.
//!
//! Reads `BIND_ADDR`, `PORT`, `INCIDENT_DATA` and `INCIDENT_ARTIFACTS` from
//! the environment.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    incident_predict_server::run_server().await
}
