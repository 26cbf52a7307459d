use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use learnhub::auth::{with_bearer_auth, TokenVerifier};
use learnhub::store::LearningStore;
use learnhub::workflows::assessments::{assessment_router, AttemptService};
use learnhub::workflows::certifications::{
    certification_router, CertificateGenerator, CertificationService,
};
use learnhub::workflows::notifications::{
    notification_router, NotificationInbox, StoreNotifier,
};
use learnhub::workflows::recommendations::{recommendation_router, RecommendationService};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Every `/api` route over one shared store, gated by bearer auth.
pub(crate) fn api_router<S>(
    store: Arc<S>,
    verifier: TokenVerifier,
    generator: CertificateGenerator,
) -> Router
where
    S: LearningStore,
{
    let notifier = Arc::new(StoreNotifier::new(Arc::clone(&store)));
    let attempts = Arc::new(AttemptService::new(Arc::clone(&store), notifier, generator));
    let recommendations = Arc::new(RecommendationService::new(Arc::clone(&store)));
    let certifications = Arc::new(CertificationService::new(Arc::clone(&store)));
    let inbox = Arc::new(NotificationInbox::new(store));

    let api = assessment_router(attempts)
        .merge(recommendation_router(recommendations))
        .merge(certification_router(certifications))
        .merge(notification_router(inbox));

    with_bearer_auth(api, verifier)
}

/// Adds the unauthenticated probes and the metrics scrape endpoint.
pub(crate) fn with_operational_routes(router: Router, state: AppState) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
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
