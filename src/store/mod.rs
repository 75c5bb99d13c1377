//! Key/value store with per-key expiration.
//!
//! Two value shapes are supported: plain string values with a time-to-live,
//! and unexpiring lists that are only ever prepended to and truncated.
//! Single-key operations are atomic; nothing spans multiple keys.

pub mod memory_store;
pub mod redis_store;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch a live value. Expired and missing keys both yield `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Fetch several values in one round trip, in the order of `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError>;

    /// Prepend `value` to the list at `key` and keep only the first `cap` entries.
    async fn push_capped(&self, key: &str, value: &str, cap: usize) -> Result<(), StoreError>;

    /// Up to `limit` entries from the head of the list at `key`.
    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Every live value key starting with `prefix`, in no particular order.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
