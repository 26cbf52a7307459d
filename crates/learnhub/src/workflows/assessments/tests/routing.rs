use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::domain::{AssessmentId, EnrollmentStatus};
use crate::store::FailurePoint;
use crate::workflows::assessments::assessment_router;

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn attempts_uri(id: impl std::fmt::Display) -> String {
    format!("/api/assessments/{id}/attempts")
}

#[tokio::test]
async fn passing_submission_returns_created_envelope() {
    let fixture = seeded();
    enroll(&fixture, EnrollmentStatus::Active);
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));

    let response = router
        .oneshot(post(
            &attempts_uri(fixture.assessment.id),
            json!({ "employee_id": fixture.employee.id.to_string(), "score": 72 }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Congratulations! You passed!");
    assert_eq!(body["data"]["status"], "Passed");
    assert_eq!(body["data"]["score"], 72.0);
    assert_eq!(
        body["data"]["employee_id"],
        fixture.employee.id.to_string()
    );
    assert_eq!(fixture.store.all_certifications().expect("snapshot").len(), 1);
}

#[tokio::test]
async fn missing_fields_are_bad_request() {
    let fixture = seeded();
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));

    let response = router
        .oneshot(post(
            &attempts_uri(fixture.assessment.id),
            json!({ "employee_id": fixture.employee.id.to_string() }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Employee ID and score are required");
    assert!(fixture.store.attempts().expect("snapshot").is_empty());
}

#[tokio::test]
async fn non_numeric_score_is_bad_request() {
    let fixture = seeded();
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));

    let response = router
        .oneshot(post(
            &attempts_uri(fixture.assessment.id),
            json!({ "employee_id": fixture.employee.id.to_string(), "score": "lots" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "score must be a number");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let fixture = seeded();
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));

    let response = router
        .oneshot(
            Request::post(attempts_uri(fixture.assessment.id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_assessment_is_not_found() {
    let fixture = seeded();
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));
    let payload = json!({ "employee_id": fixture.employee.id.to_string(), "score": 90 });

    for uri in [attempts_uri(AssessmentId::new()), attempts_uri("not-a-uuid")] {
        let response = router
            .clone()
            .oneshot(post(&uri, payload.clone()))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let body = read_json_body(response).await;
        assert_eq!(body["error"], "Assessment not found");
    }
}

#[tokio::test]
async fn input_validation_precedes_assessment_lookup() {
    let fixture = seeded();
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));

    let response = router
        .oneshot(post(&attempts_uri(AssessmentId::new()), json!({})))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn transaction_failure_is_opaque_internal_error() {
    let fixture = seeded();
    enroll(&fixture, EnrollmentStatus::Active);
    fixture
        .store
        .fail_at(FailurePoint::InsertCertification)
        .expect("arm failure");
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));

    let response = router
        .oneshot(post(
            &attempts_uri(fixture.assessment.id),
            json!({ "employee_id": fixture.employee.id.to_string(), "score": 99 }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert_eq!(
        body,
        json!({ "success": false, "error": "Failed to submit attempt" })
    );
    assert!(fixture.store.attempts().expect("snapshot").is_empty());
}

#[tokio::test]
async fn attempt_history_is_listed() {
    let fixture = seeded();
    let router = assessment_router(build_service(
        &fixture.store,
        Arc::new(RecordingNotifier::default()),
    ));

    for score in [30, 80] {
        let response = router
            .clone()
            .oneshot(post(
                &attempts_uri(fixture.assessment.id),
                json!({ "employee_id": fixture.employee.id.to_string(), "score": score }),
            ))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = router
        .oneshot(
            Request::get(attempts_uri(fixture.assessment.id))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    let data = body["data"].as_array().expect("attempt list");
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["status"], "Passed");
    assert_eq!(data[1]["status"], "Failed");
}
