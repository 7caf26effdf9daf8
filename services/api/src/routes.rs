use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use hiring_pipeline::pipeline::catalog::{self, Stage};
use hiring_pipeline::pipeline::{
    pipeline_router, EmployeeOnboarding, PipelineRepository, PipelineService, TalentDirectory,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Catalog entry with the attempt policy attached.
#[derive(Debug, Serialize)]
pub(crate) struct StageCatalogEntry {
    #[serde(flatten)]
    pub(crate) stage: Stage,
    pub(crate) attempt_limit: u8,
    pub(crate) requires_function_match: bool,
}

pub(crate) fn with_pipeline_routes<R, D, E>(
    service: Arc<PipelineService<R, D, E>>,
) -> axum::Router
where
    R: PipelineRepository + 'static,
    D: TalentDirectory + 'static,
    E: EmployeeOnboarding + 'static,
{
    pipeline_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/stages", get(stage_catalog_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn stage_catalog_endpoint() -> Json<Vec<StageCatalogEntry>> {
    Json(stage_catalog())
}

pub(crate) fn stage_catalog() -> Vec<StageCatalogEntry> {
    catalog::stages()
        .into_iter()
        .map(|stage| StageCatalogEntry {
            attempt_limit: stage.id.attempt_limit(),
            requires_function_match: stage.id.requires_function_match(),
            stage,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::build_pipeline_service;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use hiring_pipeline::config::PipelineConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<AtomicBool>) {
        let readiness = Arc::new(AtomicBool::new(ready));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_pipeline_routes(build_pipeline_service(PipelineConfig::default()))
            .layer(Extension(state));
        (router, readiness)
    }

    async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).expect("json"))
    }

    #[test]
    fn catalog_lists_every_stage_with_policy() {
        let catalog = stage_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog[0].stage.name, "HR Interview");
        assert!(catalog[2].requires_function_match);
        assert_eq!(catalog[3].attempt_limit, 2);
        assert!(catalog
            .iter()
            .filter(|entry| entry.stage.order != 4)
            .all(|entry| entry.attempt_limit == 1));
    }

    #[tokio::test]
    async fn stage_catalog_route_serializes_flat_entries() {
        let (router, _) = app(true);
        let (status, body) = get_json(router, "/api/v1/stages").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], "hr");
        assert_eq!(body[0]["order"], 1);
        assert_eq!(body[4]["id"], "offer");
        assert_eq!(body[2]["requires_function_match"], true);
    }

    #[tokio::test]
    async fn readiness_tracks_the_startup_flag() {
        let (router, readiness) = app(false);
        let (status, body) = get_json(router.clone(), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        readiness.store(true, Ordering::Release);
        let (status, body) = get_json(router, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn pipeline_routes_are_mounted() {
        let (router, _) = app(true);
        let (status, body) = get_json(router.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get_json(router, "/api/v1/applicant/apl-unknown/stages").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["reason"], "applicant_not_found");
    }
}
