//! Best-effort notifications and the per-user inbox.

pub mod domain;
pub mod notifier;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{NewNotification, Notification, NotificationCategory, NotificationEvent};
pub use notifier::{dispatch, NotificationError, Notifier, StoreNotifier};
pub use repository::{NotificationStore, INBOX_LIMIT};
pub use router::notification_router;
pub use service::{InboxError, NotificationInbox};
