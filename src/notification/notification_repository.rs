use std::sync::Arc;
use std::time::Duration;

use crate::store::{KeyValueStore, StoreError};
use super::notification_models::Notification;

/// How long a notification record stays retrievable.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Entries kept in each recipient index.
pub const RECIPIENT_INDEX_CAP: usize = 50;

const NOTIFICATION_PREFIX: &str = "notification:";

fn notification_key(id: &str) -> String {
    format!("{}{}", NOTIFICATION_PREFIX, id)
}

fn recipient_index_key(user_id: i32) -> String {
    format!("user_notifications:{}", user_id)
}

/// Sole owner of the notification records and the per-recipient indexes.
///
/// Records live under `notification:<id>` and expire after
/// [`NOTIFICATION_TTL`]. `user_notifications:<user_id>` lists record ids
/// newest first, capped at [`RECIPIENT_INDEX_CAP`], and never expires, so it
/// may point at records that are already gone. Readers skip those.
#[derive(Clone)]
pub struct NotificationRepository {
    store: Arc<dyn KeyValueStore>,
}

impl NotificationRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Writes the record, then indexes it for its recipient. The two writes
    /// are independent: if the second fails the record is still visible to
    /// scans but not to recipient lookups.
    pub async fn save(&self, notification: &Notification) -> Result<(), StoreError> {
        let payload = serde_json::to_string(notification)?;

        self.store
            .set_ex(&notification_key(&notification.id), &payload, NOTIFICATION_TTL)
            .await?;

        self.store
            .push_capped(
                &recipient_index_key(notification.user_id),
                &notification.id,
                RECIPIENT_INDEX_CAP,
            )
            .await
    }

    /// Every live record, unordered. Unreadable records are skipped.
    pub async fn find_all(&self) -> Result<Vec<Notification>, StoreError> {
        let keys = self.store.scan_prefix(NOTIFICATION_PREFIX).await?;
        self.load_many(keys).await
    }

    /// Up to `limit` records from the recipient index, newest first.
    pub async fn find_for_recipient(
        &self,
        user_id: i32,
        limit: usize,
    ) -> Result<Vec<Notification>, StoreError> {
        let ids = self
            .store
            .list_range(&recipient_index_key(user_id), limit)
            .await?;

        let keys = ids.iter().map(|id| notification_key(id)).collect();
        self.load_many(keys).await
    }

    /// Loads `keys` in one batch, keeping their order and dropping missing
    /// or unreadable records.
    async fn load_many(&self, keys: Vec<String>) -> Result<Vec<Notification>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let values = self.store.get_many(&keys).await?;

        Ok(keys
            .iter()
            .zip(values)
            .filter_map(|(key, raw)| raw.and_then(|raw| decode(key, &raw)))
            .collect())
    }
}

fn decode(key: &str, raw: &str) -> Option<Notification> {
    match serde_json::from_str(raw) {
        Ok(notification) => Some(notification),
        Err(e) => {
            tracing::warn!("Skipping unreadable notification {}: {}", key, e);
            None
        }
    }
}
