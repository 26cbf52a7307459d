use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::domain::{
    assessment_result_message, certification_message, NewNotification, Notification,
    NotificationEvent,
};
use super::repository::NotificationStore;
use crate::store::StoreError;

/// Outbound delivery of notification events.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    /// Returns `None` when the event has no addressable recipient.
    async fn deliver(&self, event: NotificationEvent)
        -> Result<Option<Notification>, NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification store failed: {0}")]
    Store(#[from] StoreError),
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Persists notifications into the recipient's inbox.
pub struct StoreNotifier<S> {
    store: Arc<S>,
}

impl<S> StoreNotifier<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> Notifier for StoreNotifier<S>
where
    S: NotificationStore,
{
    async fn deliver(
        &self,
        event: NotificationEvent,
    ) -> Result<Option<Notification>, NotificationError> {
        let employee_id = event.employee_id();
        let Some(user_id) = self.store.employee_user(&employee_id).await? else {
            debug!(%employee_id, event = event.label(), "employee has no linked user; skipping");
            return Ok(None);
        };

        let category = event.category();
        let message = match &event {
            NotificationEvent::AssessmentResult {
                assessment_title,
                score,
                passed,
                ..
            } => assessment_result_message(assessment_title, *score, *passed),
            NotificationEvent::CertificationIssued {
                course_id,
                certificate_number,
                ..
            } => {
                let Some(title) = self.store.course_title(course_id).await? else {
                    debug!(%course_id, "course missing; skipping certification notice");
                    return Ok(None);
                };
                certification_message(&title, certificate_number)
            }
        };

        let notification = self
            .store
            .insert_notification(NewNotification::new(user_id, message, category))
            .await?;
        Ok(Some(notification))
    }
}

/// Detaches delivery of `events` onto a background task.
///
/// Events are delivered in order. Failures are logged and dropped; nothing
/// is retried and the caller never observes them. The handle only exists so
/// tests can wait for completion.
pub fn dispatch<N>(notifier: Arc<N>, events: Vec<NotificationEvent>) -> JoinHandle<()>
where
    N: Notifier + ?Sized,
{
    tokio::spawn(async move {
        for event in events {
            let label = event.label();
            let employee_id = event.employee_id();
            match notifier.deliver(event).await {
                Ok(Some(notification)) => {
                    debug!(%employee_id, event = label, notification_id = %notification.id, "notification stored");
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(%employee_id, event = label, error = %err, "notification delivery failed");
                }
            }
        }
    })
}
