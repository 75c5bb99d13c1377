use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info};

use super::{KeyValueStore, StoreError};

const SCAN_BATCH: usize = 100;

/// Redis-backed store. `ConnectionManager` reconnects on its own and is cheap
/// to clone, so every call works on its own clone.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        let store = Self { conn };
        store.ping().await?;

        info!("Connected to Redis notification store");
        Ok(store)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // Redis rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds).await?;
        debug!("SET {} (TTL: {}s)", key, seconds);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let mut conn = self.conn.clone();
        let mut values = Vec::with_capacity(keys.len());

        for batch in keys.chunks(SCAN_BATCH) {
            // Explicit MGET: the typed helper sends GET for a single key.
            let found = redis::cmd("MGET")
                .arg(batch)
                .query_async::<Vec<Option<String>>>(&mut conn)
                .await?;
            values.extend(found);
        }
        Ok(values)
    }

    async fn push_capped(&self, key: &str, value: &str, cap: usize) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let stop = cap as isize - 1;
        redis::pipe()
            .atomic()
            .lpush(key, value)
            .ignore()
            .ltrim(key, 0, stop)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn list_range(&self, key: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let stop = limit as isize - 1;
        Ok(conn.lrange::<_, Vec<String>>(key, 0, stop).await?)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async::<(u64, Vec<String>)>(&mut conn)
                .await?;

            keys.extend(batch);
            cursor = next;

            if cursor == 0 {
                break;
            }
        }

        // SCAN may return a key more than once across iterations.
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}
