use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use crate::domain::EmployeeId;
use crate::workflows::recommendations::recommendation_router;

fn get(uri: String) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn recommendations_route_returns_ranked_list() {
    let catalog = catalog();
    let router = recommendation_router(build_service(&catalog.store));

    let response = router
        .oneshot(get(format!(
            "/api/ai/recommendations/{}",
            catalog.learner.id
        )))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    let data = body["data"].as_array().expect("recommendation list");
    let titles: Vec<&str> = data
        .iter()
        .map(|entry| entry["title"].as_str().expect("title"))
        .collect();
    assert_eq!(
        titles,
        vec!["Rust Fundamentals", "Observability", "API Design", "Negotiation"]
    );
    assert_eq!(data[0]["recommendation_score"], 90);
    assert_eq!(data[0]["recommendation_type"], "department");
    assert_eq!(
        data[0]["recommendation_reason"],
        "Popular in Engineering department"
    );
    assert_eq!(data[3]["recommendation_reason"], "Trending course this month");
}

#[tokio::test]
async fn unknown_or_malformed_employee_is_not_found() {
    let catalog = catalog();
    let router = recommendation_router(build_service(&catalog.store));

    for uri in [
        format!("/api/ai/recommendations/{}", EmployeeId::new()),
        "/api/ai/recommendations/not-a-uuid".to_string(),
        format!("/api/ai/learning-path/{}", EmployeeId::new()),
    ] {
        let response = router
            .clone()
            .oneshot(get(uri.clone()))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let body = read_json_body(response).await;
        assert_eq!(body["error"], "Employee not found");
    }
}

#[tokio::test]
async fn learning_path_route_returns_all_sections() {
    let catalog = catalog();
    let router = recommendation_router(build_service(&catalog.store));

    let response = router
        .oneshot(get(format!("/api/ai/learning-path/{}", catalog.learner.id)))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let data = &body["data"];
    assert!(data["current_courses"].is_array());
    assert_eq!(
        data["recommended_courses"].as_array().map(Vec::len),
        Some(4)
    );
    let path = data["learning_path"].as_array().expect("path entries");
    assert_eq!(path.len(), 4);
    assert_eq!(path[0]["status"], "recommended");
    assert_eq!(path[0]["priority"], "high");
    assert_eq!(path[2]["priority"], "medium");
    assert_eq!(path[0]["reason"], "Popular in Engineering department");
    assert!(path[0].get("estimated_completion").is_none());
}
