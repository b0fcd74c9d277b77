//! The end-to-end training run.

use std::path::Path;
use std::sync::Arc;

use incident_predict_boost::{Classifier, Regressor};
use incident_predict_features::{Encoders, TrainingTable, extract_all};
use incident_predict_store::progress::ProgressCallback;
use incident_predict_store::{DocumentStore, RawDocument};

use crate::artifacts::{ArtifactSet, ModelKind};
use crate::config::TrainingConfig;
use crate::TrainingError;

/// Trains the four models on an encoded table.
///
/// Models are fit sequentially: incident group, casualties, response
/// time, mass casualty.
///
/// # Errors
///
/// * [`TrainingError::Config`] if any model's hyper-parameters are invalid
/// * [`TrainingError::Training`] naming the first model that fails
pub fn train_models(
    table: &TrainingTable,
    encoders: Encoders,
    config: &TrainingConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ArtifactSet, TrainingError> {
    config.validate()?;

    let x = table.feature_matrix();
    let failed = |model: ModelKind| move |source| TrainingError::Training { model, source };

    progress.set_total(ModelKind::ALL.len() as u64);

    let stage = |n: usize, model: ModelKind| {
        log::info!("{n}. Training {} model...", model.label());
        progress.set_message(format!("Training {} model", model.label()));
    };

    stage(1, ModelKind::IncidentGroup);
    let incident_group = Classifier::fit(
        x.view(),
        &table.group_codes,
        encoders.group.len(),
        &config.for_model(ModelKind::IncidentGroup),
    )
    .map_err(failed(ModelKind::IncidentGroup))?;
    progress.inc(1);

    stage(2, ModelKind::Casualties);
    let casualties = Regressor::fit(
        x.view(),
        &table.casualties,
        &config.for_model(ModelKind::Casualties),
    )
    .map_err(failed(ModelKind::Casualties))?;
    progress.inc(1);

    stage(3, ModelKind::ResponseTime);
    let response_time = Regressor::fit(
        x.view(),
        &table.response_minutes,
        &config.for_model(ModelKind::ResponseTime),
    )
    .map_err(failed(ModelKind::ResponseTime))?;
    progress.inc(1);

    stage(4, ModelKind::MassCasualty);
    let mass_casualty = Classifier::fit(
        x.view(),
        &table.mass_flags,
        2,
        &config.for_model(ModelKind::MassCasualty),
    )
    .map_err(failed(ModelKind::MassCasualty))?;
    progress.inc(1);

    progress.finish("Trained 4 models".to_string());

    Ok(ArtifactSet {
        incident_group,
        casualties,
        response_time,
        mass_casualty,
        encoders,
    })
}

/// Extracts, encodes and trains on an in-memory corpus. Nothing is
/// written to disk.
///
/// # Errors
///
/// Returns the first extraction, encoding, configuration or training
/// error.
pub fn run(
    documents: &[RawDocument],
    config: &TrainingConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ArtifactSet, TrainingError> {
    let rows = extract_all(documents)?;
    log::info!("Processed {} records", rows.len());

    let encoders = Encoders::fit(&rows);
    log::info!(
        "Fitted encoders: {} regions, {} reports, {} groups",
        encoders.region.len(),
        encoders.report.len(),
        encoders.group.len()
    );

    let table = TrainingTable::build(&rows, &encoders)?;
    train_models(&table, encoders, config, progress)
}

/// Loads the corpus at `data`, trains, and saves all artifacts into
/// `output`.
///
/// # Errors
///
/// Returns any error from [`run`], a [`TrainingError::Store`] if the
/// corpus cannot be read, or a [`TrainingError::Persistence`] if the
/// artifacts cannot be written.
pub fn run_and_save(
    data: &Path,
    output: &Path,
    config: &TrainingConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ArtifactSet, TrainingError> {
    log::info!("Loading documents from {}...", data.display());
    let documents = DocumentStore::open(data).load_documents()?;

    let artifacts = run(&documents, config, progress)?;
    artifacts.save(output)?;

    Ok(artifacts)
}
