#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident dashboard and predictions.
//!
//! The corpus and the trained artifacts are loaded once at startup into an
//! [`AppContext`] shared read-only by every worker. If either fails to
//! load, the server still starts: `/api/health` reports the reason and the
//! data endpoints answer `503 Service Unavailable`.

mod handlers;
pub mod interactive;

use std::path::Path;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use incident_predict_incident_models::IncidentDocument;
use incident_predict_predict::Predictor;
use incident_predict_store::{DocumentStore, paths};

/// Default bind address when `BIND_ADDR` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default port when `PORT` is unset or invalid.
pub const DEFAULT_PORT: u16 = 8080;

/// Whether the context can serve data requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    /// Corpus and models are loaded.
    Ready,
    /// Something failed at startup.
    Unavailable {
        /// What failed.
        reason: String,
    },
}

/// Everything the handlers read, loaded once.
pub struct AppContext {
    status: ServiceStatus,
    incidents: Vec<IncidentDocument>,
    predictor: Option<Predictor>,
}

impl AppContext {
    /// A ready context over already loaded data.
    #[must_use]
    pub const fn new(incidents: Vec<IncidentDocument>, predictor: Predictor) -> Self {
        Self {
            status: ServiceStatus::Ready,
            incidents,
            predictor: Some(predictor),
        }
    }

    /// A context that answers every data request with `503`.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            status: ServiceStatus::Unavailable {
                reason: reason.into(),
            },
            incidents: Vec::new(),
            predictor: None,
        }
    }

    /// Loads the corpus at `data` and the artifacts in `artifacts`.
    ///
    /// Never fails: load errors are logged and recorded in the returned
    /// context's [`ServiceStatus`].
    #[must_use]
    pub fn load(data: &Path, artifacts: &Path) -> Self {
        log::info!("Loading incidents from {}...", data.display());
        let incidents = match DocumentStore::open(data).load_incidents() {
            Ok(incidents) => incidents,
            Err(e) => {
                log::error!("Failed to load incidents: {e}");
                return Self::unavailable(format!("incident data unavailable: {e}"));
            }
        };

        log::info!("Loading models from {}...", artifacts.display());
        let predictor = match Predictor::load(artifacts) {
            Ok(predictor) => predictor,
            Err(e) => {
                log::error!("Failed to load models: {e}");
                return Self::unavailable(format!("models unavailable: {e}"));
            }
        };

        log::info!("Ready: {} incidents, models loaded", incidents.len());
        Self::new(incidents, predictor)
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> &ServiceStatus {
        &self.status
    }

    /// The corpus and predictor, or the reason they are unavailable.
    ///
    /// # Errors
    ///
    /// Returns the startup failure reason when the context is not ready.
    pub fn ready(&self) -> Result<(&[IncidentDocument], &Predictor), &str> {
        match (&self.status, &self.predictor) {
            (ServiceStatus::Ready, Some(predictor)) => Ok((self.incidents.as_slice(), predictor)),
            (ServiceStatus::Unavailable { reason }, _) => Err(reason.as_str()),
            (ServiceStatus::Ready, None) => Err("models not loaded"),
        }
    }
}

/// Registers every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/dashboard", web::get().to(handlers::dashboard))
            .route(
                "/prediction/options",
                web::get().to(handlers::prediction_options),
            )
            .route("/prediction", web::post().to(handlers::predict)),
    );
}

/// Builds the context from `INCIDENT_DATA` / `INCIDENT_ARTIFACTS` and serves
/// on `BIND_ADDR:PORT` until shut down.
///
/// # Errors
///
/// Returns an error if the server cannot bind.
pub async fn run_server() -> std::io::Result<()> {
    let data = paths::corpus_path_from_env();
    let artifacts = paths::artifacts_dir_from_env();

    let context = tokio::task::spawn_blocking(move || AppContext::load(&data, &artifacts))
        .await
        .unwrap_or_else(|e| AppContext::unavailable(format!("startup task failed: {e}")));
    if let ServiceStatus::Unavailable { reason } = context.status() {
        log::warn!("Starting in degraded mode: {reason}");
    }
    let context = web::Data::new(context);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(context.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
