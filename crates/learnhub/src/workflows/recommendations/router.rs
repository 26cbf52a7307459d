use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use tracing::error;

use super::repository::RecommendationSource;
use super::service::{RecommendationError, RecommendationService};
use crate::domain::EmployeeId;
use crate::http;

const EMPLOYEE_NOT_FOUND: &str = "Employee not found";

pub fn recommendation_router<S>(service: Arc<RecommendationService<S>>) -> Router
where
    S: RecommendationSource,
{
    Router::new()
        .route(
            "/api/ai/recommendations/:employee_id",
            get(recommendations_handler::<S>),
        )
        .route(
            "/api/ai/learning-path/:employee_id",
            get(learning_path_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn recommendations_handler<S>(
    State(service): State<Arc<RecommendationService<S>>>,
    Path(employee_id): Path<String>,
) -> Response
where
    S: RecommendationSource,
{
    let Ok(employee_id) = employee_id.parse::<EmployeeId>() else {
        return http::failure(StatusCode::NOT_FOUND, EMPLOYEE_NOT_FOUND);
    };

    match service.recommend(&employee_id).await {
        Ok(recommendations) => http::success(StatusCode::OK, recommendations),
        Err(err) => failure(err, "Failed to fetch recommendations"),
    }
}

pub(crate) async fn learning_path_handler<S>(
    State(service): State<Arc<RecommendationService<S>>>,
    Path(employee_id): Path<String>,
) -> Response
where
    S: RecommendationSource,
{
    let Ok(employee_id) = employee_id.parse::<EmployeeId>() else {
        return http::failure(StatusCode::NOT_FOUND, EMPLOYEE_NOT_FOUND);
    };

    match service.learning_path(&employee_id).await {
        Ok(path) => http::success(StatusCode::OK, path),
        Err(err) => failure(err, "Failed to generate learning path"),
    }
}

fn failure(err: RecommendationError, public_message: &'static str) -> Response {
    match err {
        RecommendationError::EmployeeNotFound(_) => {
            http::failure(StatusCode::NOT_FOUND, EMPLOYEE_NOT_FOUND)
        }
        RecommendationError::Store(err) => {
            error!(error = %err, "recommendation lookup failed");
            http::failure(StatusCode::INTERNAL_SERVER_ERROR, public_message)
        }
    }
}
