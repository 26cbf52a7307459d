use async_trait::async_trait;

use super::domain::{NewNotification, Notification};
use crate::domain::{CourseId, EmployeeId, NotificationId, UserId};
use crate::store::StoreError;

pub const INBOX_LIMIT: usize = 50;

/// Storage seam for notification delivery and the per-user inbox.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Linked login account, or `None` when the employee is unknown or has none.
    async fn employee_user(&self, employee: &EmployeeId) -> Result<Option<UserId>, StoreError>;

    async fn course_title(&self, course: &CourseId) -> Result<Option<String>, StoreError>;

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError>;

    /// Newest first, capped at `limit`.
    async fn notifications(
        &self,
        user: &UserId,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError>;

    /// `None` when the notification does not exist or belongs to someone else.
    async fn mark_read(
        &self,
        id: &NotificationId,
        user: &UserId,
    ) -> Result<Option<Notification>, StoreError>;

    async fn mark_all_read(&self, user: &UserId) -> Result<u64, StoreError>;

    async fn unread_count(&self, user: &UserId) -> Result<u64, StoreError>;
}
