use std::sync::Arc;
use tracing::{info, warn};

use crate::broker::MessageBroker;
use super::{
    task_event::{TaskEvent, TaskEventType},
    task_models::Task,
};

/// Post-commit hook on the task mutation path.
///
/// Publishing is fire-and-forget: the send runs on its own tokio task and any
/// failure ends in a log line, so a broken channel can never fail or slow
/// down the mutation that triggered it.
/// Spawned sends are detached: two quick publishes may reach the channel out
/// of order, and sends still in flight when the runtime stops are lost.
#[derive(Clone)]
pub struct EventPublisher {
    broker: Arc<dyn MessageBroker>,
    channel: String,
}

impl EventPublisher {
    pub fn new(broker: Arc<dyn MessageBroker>, channel: impl Into<String>) -> Self {
        Self {
            broker,
            channel: channel.into(),
        }
    }

    pub fn publish(&self, event_type: TaskEventType, task: &Task, actor_id: i32) {
        let event = TaskEvent::new(event_type, task, actor_id);

        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize task event: {:?}", e);
                return;
            }
        };

        let broker = self.broker.clone();
        let channel = self.channel.clone();
        tokio::spawn(async move {
            match broker.publish(&channel, payload).await {
                Ok(()) => info!(
                    "Published {} event for task {}",
                    event.event_type, event.task_id
                ),
                Err(e) => warn!(
                    "Failed to publish {} event for task {}: {:?}",
                    event.event_type, event.task_id, e
                ),
            }
        });
    }
}
