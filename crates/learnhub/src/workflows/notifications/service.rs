use std::sync::Arc;

use super::domain::Notification;
use super::repository::{NotificationStore, INBOX_LIMIT};
use crate::domain::{NotificationId, UserId};
use crate::store::StoreError;

/// Per-user notification inbox.
pub struct NotificationInbox<S> {
    store: Arc<S>,
}

impl<S> NotificationInbox<S>
where
    S: NotificationStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        user: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, InboxError> {
        Ok(self
            .store
            .notifications(user, unread_only, INBOX_LIMIT)
            .await?)
    }

    pub async fn mark_read(
        &self,
        user: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, InboxError> {
        self.store
            .mark_read(id, user)
            .await?
            .ok_or(InboxError::NotFound(*id))
    }

    pub async fn mark_all_read(&self, user: &UserId) -> Result<u64, InboxError> {
        Ok(self.store.mark_all_read(user).await?)
    }

    pub async fn unread_count(&self, user: &UserId) -> Result<u64, InboxError> {
        Ok(self.store.unread_count(user).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("notification {0} not found")]
    NotFound(NotificationId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
