use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::{KeyValueStore, StoreError};

struct ExpiringValue {
    value: String,
    expires_at: Instant,
}

impl ExpiringValue {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process store for single-node deployments and tests.
///
/// Expiry uses `tokio::time::Instant`, so a paused test runtime can advance
/// past a TTL without sleeping. Expired values are evicted lazily when read
/// or scanned.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<DashMap<String, ExpiringValue>>,
    lists: Arc<DashMap<String, VecDeque<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn evict_if_expired(&self, key: &str, now: Instant) {
        self.values.remove_if(key, |_, entry| !entry.is_live(now));
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.values.insert(
            key.to_string(),
            ExpiringValue {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let live = self
            .values
            .get(key)
            .map(|entry| entry.is_live(now).then(|| entry.value.clone()));

        match live {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.evict_if_expired(key, now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn push_capped(&self, key: &str, value: &str, cap: usize) -> Result<(), StoreError> {
        let mut list = self.lists.entry(key.to_string()).or_default();
        list.push_front(value.to_string());
        list.truncate(cap);
        Ok(())
    }

    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lists
            .get(key)
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        self.values.retain(|_, entry| entry.is_live(now));

        Ok(self
            .values
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_value_expires_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_ex("notification:a", "payload", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(
            store.get("notification:a").await.unwrap().as_deref(),
            Some("payload")
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("notification:a").await.unwrap(), None);
        assert!(store.scan_prefix("notification:").await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_many_preserves_key_order() {
        let store = MemoryStore::new();
        store.set_ex("a", "1", Duration::from_secs(60)).await.unwrap();
        store.set_ex("short", "2", Duration::from_secs(1)).await.unwrap();
        store.set_ex("c", "3", Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;

        let keys: Vec<String> = ["c", "missing", "short", "a"]
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(
            store.get_many(&keys).await.unwrap(),
            vec![Some("3".to_string()), None, None, Some("1".to_string())]
        );
        assert!(store.get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_push_capped_keeps_newest_first() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.push_capped("list", &i.to_string(), 3).await.unwrap();
        }

        assert_eq!(store.list_range("list", 10).await.unwrap(), vec!["4", "3", "2"]);
        assert_eq!(store.list_range("list", 2).await.unwrap(), vec!["4", "3"]);
        assert!(store.list_range("missing", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_prefix_only_matches_prefix() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set_ex("notification:1", "a", ttl).await.unwrap();
        store.set_ex("notification:2", "b", ttl).await.unwrap();
        store.set_ex("other:1", "c", ttl).await.unwrap();
        store.push_capped("user_notifications:1", "1", 50).await.unwrap();

        let mut keys = store.scan_prefix("notification:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["notification:1", "notification:2"]);
    }
}
