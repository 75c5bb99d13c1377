use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{BrokerError, MessageBroker, MessageStream};

/// Redis pub/sub. Publishing shares a managed connection; every subscription
/// opens its own dedicated connection, which is closed when the stream drops.
#[derive(Clone)]
pub struct RedisBroker {
    client: redis::Client,
    conn: ConnectionManager,
}

impl RedisBroker {
    pub async fn connect(redis_url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client.clone()).await?;
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl MessageBroker for RedisBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        let mut conn = self.conn.clone();
        let receivers: i64 = conn.publish(channel, payload).await?;
        if receivers == 0 {
            tracing::debug!("No subscribers on {}, message dropped", channel);
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageStream, BrokerError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let stream = pubsub
            .into_on_message()
            .map(|msg| msg.get_payload::<String>().map_err(BrokerError::from));

        Ok(stream.boxed())
    }
}
