use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use tracing::error;

use super::domain::CertificationFilter;
use super::repository::CertificationStore;
use super::service::{CertificationError, CertificationService};
use crate::domain::CertificationId;
use crate::http;

/// Read-only certificate endpoints.
pub fn certification_router<S>(service: Arc<CertificationService<S>>) -> Router
where
    S: CertificationStore,
{
    Router::new()
        .route("/api/certifications", get(list_handler::<S>))
        .route(
            "/api/certifications/:certification_id",
            get(detail_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<CertificationService<S>>>,
    Query(filter): Query<CertificationFilter>,
) -> Response
where
    S: CertificationStore,
{
    match service.list(filter).await {
        Ok(certifications) => http::success(StatusCode::OK, certifications),
        Err(err) => {
            error!(error = %err, "certification listing failed");
            http::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch certifications",
            )
        }
    }
}

pub(crate) async fn detail_handler<S>(
    State(service): State<Arc<CertificationService<S>>>,
    Path(certification_id): Path<String>,
) -> Response
where
    S: CertificationStore,
{
    let Ok(id) = certification_id.parse::<CertificationId>() else {
        return http::failure(StatusCode::NOT_FOUND, "Certification not found");
    };

    match service.get(&id).await {
        Ok(certification) => http::success(StatusCode::OK, certification),
        Err(CertificationError::NotFound(_)) => {
            http::failure(StatusCode::NOT_FOUND, "Certification not found")
        }
        Err(err) => {
            error!(error = %err, %id, "certification lookup failed");
            http::failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch certification",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{NaiveDate, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::domain::{CourseId, EmployeeId};
    use crate::store::MemoryStore;
    use crate::workflows::certifications::{Certification, CertificationStatus};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn certificate(employee_id: EmployeeId, number: &str, expiry: NaiveDate) -> Certification {
        Certification {
            id: CertificationId::new(),
            employee_id,
            course_id: CourseId::new(),
            certificate_number: number.to_string(),
            issue_date: date(2020, 1, 15),
            expiry_date: expiry,
            status: CertificationStatus::Active,
            created_at: Utc::now(),
        }
    }

    fn router_with(certifications: &[Certification]) -> Router {
        let store = MemoryStore::new();
        for certification in certifications {
            store
                .insert_certification(certification.clone())
                .expect("seed certification");
        }
        certification_router(Arc::new(CertificationService::new(Arc::new(store))))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("router responds");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    #[tokio::test]
    async fn listing_filters_by_employee() {
        let ada = EmployeeId::new();
        let grace = EmployeeId::new();
        let router = router_with(&[
            certificate(ada, "CERT-1-AAAAAAAAA", date(2999, 1, 15)),
            certificate(grace, "CERT-2-BBBBBBBBB", date(2999, 1, 15)),
        ]);

        let (status, body) =
            get_json(router, &format!("/api/certifications?employee_id={ada}")).await;

        assert_eq!(status, StatusCode::OK);
        let data = body["data"].as_array().expect("certificate list");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["certificate_number"], "CERT-1-AAAAAAAAA");
        assert_eq!(data[0]["status"], "Active");
    }

    #[tokio::test]
    async fn lapsed_certificate_reads_as_expired() {
        let lapsed = certificate(EmployeeId::new(), "CERT-3-CCCCCCCCC", date(2021, 1, 15));
        let router = router_with(std::slice::from_ref(&lapsed));

        let (status, body) =
            get_json(router, &format!("/api/certifications/{}", lapsed.id)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "Expired");
        assert_eq!(body["data"]["expiry_date"], "2021-01-15");
    }

    #[tokio::test]
    async fn unknown_or_malformed_id_is_not_found() {
        for uri in [
            format!("/api/certifications/{}", CertificationId::new()),
            "/api/certifications/not-a-uuid".to_string(),
        ] {
            let (status, body) = get_json(router_with(&[]), &uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], "Certification not found");
        }
    }
}
