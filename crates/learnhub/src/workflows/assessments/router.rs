use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use tracing::{debug, error};

use super::domain::AttemptSubmission;
use super::repository::AssessmentStore;
use super::service::{AttemptService, AttemptServiceError};
use crate::domain::AssessmentId;
use crate::http;
use crate::workflows::notifications::Notifier;

const NOT_FOUND: &str = "Assessment not found";

/// Attempt submission and history for a single assessment.
pub fn assessment_router<S, N>(service: Arc<AttemptService<S, N>>) -> Router
where
    S: AssessmentStore,
    N: Notifier,
{
    Router::new()
        .route(
            "/api/assessments/:assessment_id/attempts",
            post(submit_handler::<S, N>).get(list_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn submit_handler<S, N>(
    State(service): State<Arc<AttemptService<S, N>>>,
    Path(assessment_id): Path<String>,
    payload: Result<Json<AttemptSubmission>, JsonRejection>,
) -> Response
where
    S: AssessmentStore,
    N: Notifier,
{
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            debug!(error = %rejection, "attempt payload rejected");
            return http::failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    if let Err(rejection) = submission.validate() {
        return http::failure(StatusCode::BAD_REQUEST, rejection.to_string());
    }

    let Ok(assessment_id) = assessment_id.parse::<AssessmentId>() else {
        return http::failure(StatusCode::NOT_FOUND, NOT_FOUND);
    };

    match service.submit(assessment_id, submission).await {
        Ok(outcome) => http::success_with_message(
            StatusCode::CREATED,
            outcome.attempt,
            outcome.message,
        ),
        Err(AttemptServiceError::InvalidInput(rejection)) => {
            http::failure(StatusCode::BAD_REQUEST, rejection.to_string())
        }
        Err(AttemptServiceError::AssessmentNotFound(_)) => {
            http::failure(StatusCode::NOT_FOUND, NOT_FOUND)
        }
        Err(err) => {
            error!(error = %err, %assessment_id, "attempt submission failed");
            http::failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to submit attempt")
        }
    }
}

pub(crate) async fn list_handler<S, N>(
    State(service): State<Arc<AttemptService<S, N>>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: AssessmentStore,
    N: Notifier,
{
    let Ok(assessment_id) = assessment_id.parse::<AssessmentId>() else {
        return http::success(StatusCode::OK, Vec::<()>::new());
    };

    match service.attempts(&assessment_id).await {
        Ok(attempts) => http::success(StatusCode::OK, attempts),
        Err(err) => {
            error!(error = %err, %assessment_id, "attempt listing failed");
            http::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch attempts",
            )
        }
    }
}
