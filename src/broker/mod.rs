//! Publish/subscribe transport for task events.
//!
//! Delivery is at-most-once: a message published while nobody is subscribed
//! to the channel is gone. There is no replay and no consumer group; every
//! live subscription sees every message published while it is attached.

pub mod memory_broker;
pub mod redis_broker;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub use memory_broker::MemoryBroker;
pub use redis_broker::RedisBroker;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Subscriber lagged behind, {0} messages skipped")]
    Lagged(u64),
}

/// Messages received on one subscription. The stream ending means the
/// subscription was lost and has to be re-established.
pub type MessageStream = BoxStream<'static, Result<String, BrokerError>>;

#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError>;

    async fn subscribe(&self, channel: &str) -> Result<MessageStream, BrokerError>;
}
