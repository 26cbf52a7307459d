//! JSON envelope shared by every API response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
}

pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = Envelope {
        success: true,
        data,
        message: None,
    };
    (status, Json(body)).into_response()
}

pub fn success_with_message<T: Serialize>(
    status: StatusCode,
    data: T,
    message: impl Into<String>,
) -> Response {
    let body = Envelope {
        success: true,
        data,
        message: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

pub fn failure(status: StatusCode, error: impl Into<String>) -> Response {
    let body = ErrorEnvelope {
        success: false,
        error: error.into(),
    };
    (status, Json(body)).into_response()
}
