use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::repository::NotificationStore;
use super::service::{InboxError, NotificationInbox};
use crate::auth::AuthClaims;
use crate::domain::NotificationId;
use crate::http;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct InboxQuery {
    #[serde(default)]
    unread_only: Option<bool>,
}

/// Inbox endpoints. Handlers read the caller from `AuthClaims`, so the router
/// must sit behind the bearer middleware.
pub fn notification_router<S>(inbox: Arc<NotificationInbox<S>>) -> Router
where
    S: NotificationStore,
{
    Router::new()
        .route("/api/notifications", get(list_handler::<S>))
        .route(
            "/api/notifications/unread-count",
            get(unread_count_handler::<S>),
        )
        .route("/api/notifications/read-all", put(read_all_handler::<S>))
        .route(
            "/api/notifications/:notification_id/read",
            put(read_handler::<S>),
        )
        .with_state(inbox)
}

pub(crate) async fn list_handler<S>(
    State(inbox): State<Arc<NotificationInbox<S>>>,
    Extension(claims): Extension<AuthClaims>,
    Query(query): Query<InboxQuery>,
) -> Response
where
    S: NotificationStore,
{
    let unread_only = query.unread_only.unwrap_or(false);
    match inbox.list(&claims.user_id, unread_only).await {
        Ok(notifications) => http::success(StatusCode::OK, notifications),
        Err(err) => internal_error(err, "Failed to fetch notifications"),
    }
}

pub(crate) async fn unread_count_handler<S>(
    State(inbox): State<Arc<NotificationInbox<S>>>,
    Extension(claims): Extension<AuthClaims>,
) -> Response
where
    S: NotificationStore,
{
    match inbox.unread_count(&claims.user_id).await {
        Ok(count) => http::success(StatusCode::OK, json!({ "count": count })),
        Err(err) => internal_error(err, "Failed to count notifications"),
    }
}

pub(crate) async fn read_handler<S>(
    State(inbox): State<Arc<NotificationInbox<S>>>,
    Extension(claims): Extension<AuthClaims>,
    Path(notification_id): Path<String>,
) -> Response
where
    S: NotificationStore,
{
    let Ok(id) = notification_id.parse::<NotificationId>() else {
        return http::failure(StatusCode::NOT_FOUND, "Notification not found");
    };

    match inbox.mark_read(&claims.user_id, &id).await {
        Ok(notification) => http::success_with_message(
            StatusCode::OK,
            notification,
            "Notification marked as read",
        ),
        Err(InboxError::NotFound(_)) => {
            http::failure(StatusCode::NOT_FOUND, "Notification not found")
        }
        Err(err) => internal_error(err, "Failed to update notification"),
    }
}

pub(crate) async fn read_all_handler<S>(
    State(inbox): State<Arc<NotificationInbox<S>>>,
    Extension(claims): Extension<AuthClaims>,
) -> Response
where
    S: NotificationStore,
{
    match inbox.mark_all_read(&claims.user_id).await {
        Ok(updated) => http::success_with_message(
            StatusCode::OK,
            json!({ "updated": updated }),
            "All notifications marked as read",
        ),
        Err(err) => internal_error(err, "Failed to update notifications"),
    }
}

fn internal_error(err: InboxError, public_message: &'static str) -> Response {
    error!(error = %err, "notification inbox request failed");
    http::failure(StatusCode::INTERNAL_SERVER_ERROR, public_message)
}
