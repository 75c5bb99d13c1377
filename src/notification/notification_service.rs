use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::store::StoreError;
use crate::task::task_event::{TaskEvent, TaskEventType};
use super::{
    notification_models::Notification,
    notification_repository::NotificationRepository,
};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 200;

/// Limits outside `(0, MAX_LIMIT]` fall back to [`DEFAULT_LIMIT`].
pub fn normalize_limit(limit: i64) -> usize {
    if limit <= 0 || limit > MAX_LIMIT {
        DEFAULT_LIMIT as usize
    } else {
        limit as usize
    }
}

pub fn generate_message(event_type: &TaskEventType, task_name: &str, assigned_to: i32) -> String {
    match event_type {
        TaskEventType::TaskCreated => {
            format!("Task '{}' assigned to user {}", task_name, assigned_to)
        }
        TaskEventType::TaskUpdated => {
            format!("Task '{}' updated (assigned to user {})", task_name, assigned_to)
        }
        TaskEventType::TaskDeleted => {
            format!("Task '{}' deleted (was assigned to user {})", task_name, assigned_to)
        }
        TaskEventType::Other(action) => format!(
            "Action '{}' performed on task '{}' (assigned to user {})",
            action, task_name, assigned_to
        ),
    }
}

fn newest_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Turns consumed task events into notifications and answers the read
/// queries.
///
/// Recipient queries read the per-recipient index. Actor queries filter on
/// `assigned_by`, which is not indexed, so they scan every record.
/// "Most recent" is the true timestamp maximum over a full scan.
#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }

    pub async fn process_task_event(&self, event: &TaskEvent) -> Result<Notification, StoreError> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            task_id: event.task_id,
            action: event.event_type.to_string(),
            task_name: event.task_name.clone(),
            user_id: event.assigned_to,
            assigned_by: event.assigned_by,
            message: generate_message(&event.event_type, &event.task_name, event.assigned_to),
            timestamp: Utc::now(),
        };

        self.repo.save(&notification).await?;

        info!(
            "Notification stored for user {}: {} (assigned by user {})",
            notification.user_id, notification.message, notification.assigned_by
        );
        Ok(notification)
    }

    pub async fn get_most_recent(&self) -> Result<Option<Notification>, StoreError> {
        let notifications = self.repo.find_all().await?;
        Ok(latest(notifications))
    }

    /// Latest notification this user caused, not one addressed to them.
    pub async fn get_most_recent_for_actor(
        &self,
        actor_id: i32,
    ) -> Result<Option<Notification>, StoreError> {
        let notifications = self.repo.find_all().await?;
        Ok(latest(
            notifications
                .into_iter()
                .filter(|n| n.assigned_by == actor_id),
        ))
    }

    pub async fn get_all(&self, limit: i64) -> Result<Vec<Notification>, StoreError> {
        let mut notifications = self.repo.find_all().await?;
        newest_first(&mut notifications);
        notifications.truncate(normalize_limit(limit));
        Ok(notifications)
    }

    pub async fn get_for_actor(
        &self,
        actor_id: i32,
        limit: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let mut notifications: Vec<_> = self
            .repo
            .find_all()
            .await?
            .into_iter()
            .filter(|n| n.assigned_by == actor_id)
            .collect();
        newest_first(&mut notifications);
        notifications.truncate(normalize_limit(limit));
        Ok(notifications)
    }

    /// Index order (newest insert first), which is consumption order and may
    /// differ from publish order.
    pub async fn get_for_recipient(
        &self,
        user_id: i32,
        limit: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        self.repo
            .find_for_recipient(user_id, normalize_limit(limit))
            .await
    }
}

fn latest(notifications: impl IntoIterator<Item = Notification>) -> Option<Notification> {
    notifications.into_iter().max_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    })
}
