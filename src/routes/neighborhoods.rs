use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::MatchingSettings;
use crate::core::{CancelFlag, Engine};
use crate::error::EngineError;
use crate::models::{ErrorResponse, HealthResponse, MatchNeighborhoodsRequest, MatchNeighborhoodsResponse, ReloadResponse};
use crate::services::CorpusStore;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub corpus: Arc<CorpusStore>,
    pub matching: MatchingSettings,
}

/// Configure all neighborhood-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/neighborhoods/match", web::post().to(match_neighborhoods))
        .route("/corpus/reload", web::post().to(reload_corpus));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let neighborhoods = state.corpus.snapshot().await.neighborhoods.len();
    let status = if neighborhoods > 0 { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        neighborhoods,
    })
}

/// Rank neighborhoods endpoint
///
/// POST /api/v1/neighborhoods/match
///
/// Request body:
/// ```json
/// {
///   "profile": { "budget": 2400, "priorities": { "walkability": 9, ... } },
///   "limit": 10
/// }
/// ```
async fn match_neighborhoods(
    state: web::Data<AppState>,
    req: web::Json<MatchNeighborhoodsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let request = req.into_inner();
    let limit = request
        .limit
        .unwrap_or(state.matching.default_limit)
        .min(state.matching.max_limit) as usize;

    let corpus = state.corpus.snapshot().await;
    let engine = state.engine.clone();
    let cancel = CancelFlag::new();
    let run_cancel = cancel.clone();
    let as_of = chrono::Utc::now();

    tracing::info!(
        "Ranking {} neighborhoods, limit: {}",
        corpus.neighborhoods.len(),
        limit
    );

    // Scoring is CPU-bound, so it runs off the async workers
    let handle = tokio::task::spawn_blocking(move || {
        engine.rank_with_cancel(&request.profile, &corpus, as_of, Some(limit), &run_cancel)
    });

    let timeout = Duration::from_millis(state.matching.timeout_ms);
    let outcome = match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::error!("Scoring task failed: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Scoring failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
        Err(_) => {
            cancel.cancel();
            tracing::warn!("Scoring run exceeded {}ms, cancelled", state.matching.timeout_ms);
            return engine_error_response(&EngineError::Cancelled);
        }
    };

    match outcome {
        Ok(outcome) => {
            tracing::info!(
                "Returning {} neighborhoods ({} diagnostics) from {} candidates",
                outcome.results.len(),
                outcome.diagnostics.len(),
                outcome.total_candidates
            );

            HttpResponse::Ok().json(MatchNeighborhoodsResponse {
                results: outcome.results,
                diagnostics: outcome.diagnostics,
                total_candidates: outcome.total_candidates,
                generated_at: as_of,
            })
        }
        Err(e) => engine_error_response(&e),
    }
}

/// Reload the corpus snapshot from disk
///
/// POST /api/v1/corpus/reload
async fn reload_corpus(state: web::Data<AppState>) -> impl Responder {
    match state.corpus.reload().await {
        Ok(corpus) => HttpResponse::Ok().json(ReloadResponse {
            neighborhoods: corpus.neighborhoods.len(),
            peers: corpus.peers.len(),
        }),
        Err(e) => {
            tracing::error!("Failed to reload corpus: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to reload corpus".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

fn engine_error_response(error: &EngineError) -> HttpResponse {
    let body = |status_code: u16| ErrorResponse {
        error: error.kind().to_string(),
        message: error.to_string(),
        status_code,
    };

    match error {
        EngineError::InvalidProfile(_) => HttpResponse::BadRequest().json(body(400)),
        EngineError::EmptyCorpus => HttpResponse::UnprocessableEntity().json(body(422)),
        EngineError::Cancelled => HttpResponse::ServiceUnavailable().json(body(503)),
        EngineError::Configuration(_) | EngineError::InsufficientData { .. } => {
            tracing::error!("Unexpected engine error: {}", error);
            HttpResponse::InternalServerError().json(body(500))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dimension, Metric, MetricReading, NeighborhoodCorpus, NeighborhoodRecord};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    fn record(id: &str, walk: f64, crime: f64) -> NeighborhoodRecord {
        let reading = |value: f64| MetricReading {
            value,
            unit: String::new(),
            last_updated: chrono::Utc::now(),
            completeness: 1.0,
        };
        NeighborhoodRecord {
            id: id.to_string(),
            name: id.to_string(),
            city: "Seattle, WA".to_string(),
            metrics: [(Metric::WalkScore, reading(walk)), (Metric::CrimeRate, reading(crime))]
                .into_iter()
                .collect(),
        }
    }

    fn state(neighborhoods: Vec<NeighborhoodRecord>) -> AppState {
        AppState {
            engine: Arc::new(Engine::with_default_config().unwrap()),
            corpus: Arc::new(
                CorpusStore::from_corpus(NeighborhoodCorpus { neighborhoods, peers: vec![] }).unwrap(),
            ),
            matching: MatchingSettings::default(),
        }
    }

    fn priorities() -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = Dimension::CORE
            .iter()
            .map(|d| (d.name().to_string(), json!(5)))
            .collect();
        serde_json::Value::Object(map)
    }

    #[actix_web::test]
    async fn test_match_endpoint() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(vec![
                    record("fremont", 82.0, 12.0),
                    record("ballard", 88.0, 18.0),
                    record("capitol-hill", 95.0, 25.0),
                ])))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/neighborhoods/match")
            .set_json(json!({ "profile": { "priorities": priorities() }, "limit": 2 }))
            .to_request();
        let resp: MatchNeighborhoodsResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.total_candidates, 3);
        assert!(resp.results[0].score >= resp.results[1].score);
    }

    #[actix_web::test]
    async fn test_invalid_profile_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(vec![record("fremont", 82.0, 12.0)])))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/neighborhoods/match")
            .set_json(json!({ "profile": { "priorities": { "beachAccess": 4 } } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_empty_corpus_is_unprocessable() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(vec![])))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/neighborhoods/match")
            .set_json(json!({ "profile": { "priorities": priorities() } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(vec![record("fremont", 82.0, 12.0)])))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.neighborhoods, 1);
    }

    #[actix_web::test]
    async fn test_timeout_cancels_run() {
        let neighborhoods = (0..20_000)
            .map(|i| record(&format!("n{:05}", i), (i % 100) as f64, (i % 37) as f64))
            .collect();
        let mut app_state = state(neighborhoods);
        app_state.matching = MatchingSettings {
            timeout_ms: 0,
            ..MatchingSettings::default()
        };

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/neighborhoods/match")
            .set_json(json!({ "profile": { "priorities": priorities() } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "CancelledError");
        assert_eq!(body.status_code, 503);
    }
}
