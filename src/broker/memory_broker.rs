use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use super::{BrokerError, MessageBroker, MessageStream};

const CHANNEL_CAPACITY: usize = 100;

/// In-process broker: one tokio broadcast channel per topic.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    channels: Arc<DashMap<String, broadcast::Sender<String>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Number of live subscriptions on `channel`.
    #[cfg(test)]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageBroker for MemoryBroker {
    async fn publish(&self, channel: &str, payload: String) -> Result<(), BrokerError> {
        // A send error only means nobody is listening.
        if self.sender(channel).send(payload).is_err() {
            tracing::debug!("No subscribers on {}, message dropped", channel);
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<MessageStream, BrokerError> {
        let rx = self.sender(channel).subscribe();
        let stream = BroadcastStream::new(rx).map(|item| {
            item.map_err(|BroadcastStreamRecvError::Lagged(skipped)| BrokerError::Lagged(skipped))
        });

        Ok(stream.boxed())
    }
}
