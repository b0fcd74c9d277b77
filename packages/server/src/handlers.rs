//! HTTP handler functions for the incident predict API.

use actix_web::{HttpResponse, web};
use incident_predict_predict::{PredictError, PredictionInput};
use incident_predict_server_models::{
    ApiDashboard, ApiError, ApiHealth, ApiPrediction, ApiPredictionOptions, DashboardQueryParams,
    PredictionRequest,
};
use incident_predict_store::queries::{self, DashboardFilter};
use incident_predict_training::ModelKind;

use crate::{AppContext, ServiceStatus};

fn unavailable(reason: &str) -> HttpResponse {
    HttpResponse::ServiceUnavailable().json(ApiError::new(reason))
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppContext>) -> HttpResponse {
    let reason = match state.status() {
        ServiceStatus::Ready => None,
        ServiceStatus::Unavailable { reason } => Some(reason.clone()),
    };

    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        ready: reason.is_none(),
        reason,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/dashboard`
///
/// Aggregates the corpus under the optional year, group, level, and region
/// filters.
pub async fn dashboard(
    state: web::Data<AppContext>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let (incidents, _) = match state.ready() {
        Ok(ready) => ready,
        Err(reason) => return unavailable(reason),
    };

    let filter = match DashboardFilter::parse(
        params.year.as_deref(),
        params.group.as_deref(),
        params.level.as_deref(),
        params.region.as_deref(),
    ) {
        Ok(filter) => filter,
        Err(e) => return HttpResponse::BadRequest().json(ApiError::new(e)),
    };

    let summary = queries::summarize(incidents, &filter);
    HttpResponse::Ok().json(ApiDashboard::from(summary))
}

/// `GET /api/prediction/options`
///
/// Known regions and reports plus the feature importances of the group and
/// casualty models.
pub async fn prediction_options(state: web::Data<AppContext>) -> HttpResponse {
    let (_, predictor) = match state.ready() {
        Ok(ready) => ready,
        Err(reason) => return unavailable(reason),
    };

    HttpResponse::Ok().json(ApiPredictionOptions {
        regions: predictor.region_options().to_vec(),
        reports: predictor.report_options().to_vec(),
        group_factors: predictor
            .feature_factors(ModelKind::IncidentGroup)
            .into(),
        casualty_factors: predictor.feature_factors(ModelKind::Casualties).into(),
    })
}

/// `POST /api/prediction`
pub async fn predict(
    state: web::Data<AppContext>,
    body: web::Json<PredictionRequest>,
) -> HttpResponse {
    let (_, predictor) = match state.ready() {
        Ok(ready) => ready,
        Err(reason) => return unavailable(reason),
    };

    let result = PredictionInput::parse(&body.region, &body.report, &body.occurred_at)
        .and_then(|input| predictor.predict(&input));

    match result {
        Ok(prediction) => HttpResponse::Ok().json(ApiPrediction::from(prediction)),
        Err(e @ PredictError::InvalidTimestamp(_)) => {
            HttpResponse::BadRequest().json(ApiError::new(e))
        }
        Err(e @ PredictError::Encoding(_)) => {
            log::debug!("Rejected prediction input: {e}");
            HttpResponse::UnprocessableEntity().json(ApiError::new(e))
        }
        Err(e @ PredictError::Model(_)) => {
            log::error!("Prediction failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use incident_predict_incident_models::{
        Address, IncidentDocument, MassCasualty, Nature, StatusTimes,
    };
    use incident_predict_predict::Predictor;
    use incident_predict_server_models::ApiChart;
    use incident_predict_store::RawDocument;
    use incident_predict_store::progress::null_progress;
    use incident_predict_training::TrainingConfig;
    use serde_json::{Value, json};

    use super::*;
    use crate::configure;

    const REGIONS: [&str; 3] = ["AGRESTE", "RMR", "SERTAO"];
    const GROUPS: [&str; 3] = ["FIRE", "PRE_HOSPITAL_CARE", "RESCUE"];

    fn occurred_at(i: usize) -> NaiveDateTime {
        let year = if i % 2 == 0 { 2023 } else { 2024 };
        NaiveDate::from_ymd_opt(year, 3, 1 + u32::try_from(i % 28).unwrap())
            .unwrap()
            .and_hms_opt(u32::try_from(i % 24).unwrap(), 10, 0)
            .unwrap()
    }

    fn incident(i: usize) -> IncidentDocument {
        let at = occurred_at(i);
        IncidentDocument {
            notice_number: format!("AV-{i:08}"),
            occurred_at: at,
            year: chrono::Datelike::year(&at),
            operational_region: REGIONS[i % 3].to_string(),
            nature: Nature {
                initial_report: format!("Report {}", i % 4),
                group: GROUPS[i % 3].to_string(),
            },
            address: Address {
                municipality: "Recife".to_string(),
                neighborhood: "Centro".to_string(),
            },
            status_times: StatusTimes {
                h1_receipt: at,
                h4_arrival: at + Duration::minutes(15),
            },
            mass_casualty: MassCasualty::from_casualties(if i % 5 == 0 { 7 } else { 0 }),
        }
    }

    fn context() -> AppContext {
        let incidents: Vec<IncidentDocument> = (0..60).map(incident).collect();
        let documents: Vec<RawDocument> = incidents
            .iter()
            .map(|doc| match serde_json::to_value(doc).unwrap() {
                Value::Object(map) => map,
                _ => unreachable!(),
            })
            .collect();

        let mut config = TrainingConfig::default().with_seed(9);
        config.incident_group.n_estimators = 10;
        config.casualties.n_estimators = 10;
        config.response_time.n_estimators = 10;
        config.mass_casualty.n_estimators = 10;
        let artifacts =
            incident_predict_training::run(&documents, &config, &null_progress()).unwrap();

        AppContext::new(incidents, Predictor::new(artifacts))
    }

    macro_rules! service {
        ($context:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($context))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health_reports_readiness() {
        let app = service!(context());
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(body.healthy);
        assert!(body.ready);
        assert!(body.reason.is_none());

        let app = service!(AppContext::unavailable("models unavailable: missing"));
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: ApiHealth = test::call_and_read_body_json(&app, req).await;
        assert!(body.healthy);
        assert!(!body.ready);
        assert_eq!(body.reason.as_deref(), Some("models unavailable: missing"));
    }

    #[actix_web::test]
    async fn unavailable_context_answers_503() {
        let app = service!(AppContext::unavailable("incident data unavailable"));

        for uri in ["/api/dashboard", "/api/prediction/options"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        }

        let req = test::TestRequest::post()
            .uri("/api/prediction")
            .set_json(json!({"region": "RMR", "report": "Report 1", "occurredAt": "2024-06-01T08:30"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "incident data unavailable");
    }

    #[actix_web::test]
    async fn dashboard_applies_filters() {
        let app = service!(context());

        let req = test::TestRequest::get().uri("/api/dashboard").to_request();
        let all: ApiDashboard = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.total, 60);
        assert_eq!(all.years, vec![2024, 2023]);
        assert_eq!(all.total_casualties, 12 * 7);

        let req = test::TestRequest::get()
            .uri("/api/dashboard?year=2024&region=All&group=FIRE")
            .to_request();
        let filtered: ApiDashboard = test::call_and_read_body_json(&app, req).await;
        // Odd indices in 2024, multiples of three are FIRE: 3, 9, 15, ...
        assert_eq!(filtered.total, 10);
        assert!(filtered.latest.iter().all(|i| i.group == "FIRE"));
    }

    #[actix_web::test]
    async fn dashboard_rejects_bad_year() {
        let app = service!(context());
        let req = test::TestRequest::get()
            .uri("/api/dashboard?year=last")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "invalid year filter 'last'");
    }

    #[actix_web::test]
    async fn options_list_known_categories() {
        let app = service!(context());
        let req = test::TestRequest::get()
            .uri("/api/prediction/options")
            .to_request();
        let body: ApiPredictionOptions = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.regions, REGIONS);
        assert_eq!(body.reports.len(), 4);
        let ApiChart { labels, data } = body.group_factors;
        assert_eq!(labels.len(), 4);
        assert_eq!(data.len(), 4);
        assert_eq!(body.casualty_factors.labels.len(), 4);
    }

    #[actix_web::test]
    async fn prediction_round_trip() {
        let app = service!(context());
        let req = test::TestRequest::post()
            .uri("/api/prediction")
            .set_json(json!({"region": "RMR", "report": "Report 1", "occurredAt": "2024-06-01T08:30"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ApiPrediction = test::read_body_json(resp).await;
        assert!(GROUPS.contains(&body.incident_group.as_str()));
        assert_eq!(body.group_probabilities.labels.len(), 3);
        assert_eq!(body.response_minutes, 15);
        assert!((0.0..=100.0).contains(&body.mass_casualty_risk));
    }

    #[actix_web::test]
    async fn prediction_errors_map_to_status_codes() {
        let app = service!(context());

        let req = test::TestRequest::post()
            .uri("/api/prediction")
            .set_json(json!({"region": "ATLANTIS", "report": "Report 1", "occurredAt": "2024-06-01T08:30"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: ApiError = test::read_body_json(resp).await;
        assert_eq!(body.error, "Unknown region 'ATLANTIS'");

        let req = test::TestRequest::post()
            .uri("/api/prediction")
            .set_json(json!({"region": "RMR", "report": "Report 1", "occurredAt": "soon"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
