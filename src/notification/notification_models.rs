use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Recipient-facing record derived from one consumed task event.
///
/// `id` is freshly generated at consumption time, so a re-delivered event
/// yields a second record rather than overwriting the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: String,
    pub task_id: i32,
    pub action: String,
    pub task_name: String,
    /// Recipient (the task's assignee).
    pub user_id: i32,
    /// Actor whose mutation produced the event.
    pub assigned_by: i32,
    pub message: String,
    /// When the notification was generated, not when the event was published.
    pub timestamp: DateTime<Utc>,
}

/// Notification as returned by the read API. The recipient is always
/// reported as `assigned_to`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationView {
    pub id: String,
    pub task_id: i32,
    pub action: String,
    pub task_name: String,
    pub assigned_to: i32,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            task_id: n.task_id,
            action: n.action,
            task_name: n.task_name,
            assigned_to: n.user_id,
            message: n.message,
            timestamp: n.timestamp,
        }
    }
}
