use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broker::{MessageBroker, MessageStream};
use crate::task::task_event::TaskEvent;
use super::notification_service::NotificationService;

/// Exponential delay between retries, doubling up to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    min: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.min(max);
        Self {
            min,
            max,
            current: min,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.min;
    }
}

enum ListenOutcome {
    Cancelled,
    SubscriptionLost,
}

/// Long-lived consumer of the task event channel.
///
/// Subscribes once, then handles messages one at a time. Receive errors,
/// undecodable payloads and processing failures are logged and the loop
/// carries on; a lost subscription is re-established with backoff. Only the
/// cancellation token ends the loop, which drops (and so closes) the
/// subscription.
pub struct EventSubscriber {
    broker: Arc<dyn MessageBroker>,
    service: NotificationService,
    channel: String,
    backoff: Backoff,
}

impl EventSubscriber {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        service: NotificationService,
        channel: impl Into<String>,
        backoff: Backoff,
    ) -> Self {
        Self {
            broker,
            service,
            channel: channel.into(),
            backoff,
        }
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Starting notification event listener on {}", self.channel);

        loop {
            let subscribed = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.broker.subscribe(&self.channel) => result,
            };

            let stream = match subscribed {
                Ok(stream) => {
                    info!("Subscribed to {}", self.channel);
                    stream
                }
                Err(e) => {
                    warn!("Failed to subscribe to {}: {}", self.channel, e);
                    if !pause(&shutdown, self.backoff.next_delay()).await {
                        break;
                    }
                    continue;
                }
            };

            match self.listen(stream, &shutdown).await {
                ListenOutcome::Cancelled => break,
                ListenOutcome::SubscriptionLost => {
                    warn!("Subscription to {} closed, resubscribing", self.channel);
                    if !pause(&shutdown, self.backoff.next_delay()).await {
                        break;
                    }
                }
            }
        }

        info!("Event subscriber shutting down");
    }

    async fn listen(&mut self, mut stream: MessageStream, shutdown: &CancellationToken) -> ListenOutcome {
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => return ListenOutcome::Cancelled,
                received = stream.next() => received,
            };

            match received {
                Some(Ok(payload)) => {
                    self.backoff.reset();
                    self.handle_message(&payload).await;
                }
                Some(Err(e)) => {
                    warn!("Error receiving message: {}", e);
                    if !pause(shutdown, self.backoff.next_delay()).await {
                        return ListenOutcome::Cancelled;
                    }
                }
                None => return ListenOutcome::SubscriptionLost,
            }
        }
    }

    async fn handle_message(&self, payload: &str) {
        let event: TaskEvent = match serde_json::from_str(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to decode task event, dropping it: {}", e);
                return;
            }
        };

        debug!("Received event: {} for task {}", event.event_type, event.task_id);

        if let Err(e) = self.service.process_task_event(&event).await {
            error!(
                "Failed to process {} event for task {}: {:?}",
                event.event_type, event.task_id, e
            );
        }
    }
}

/// Sleeps for `delay`. Returns false if cancelled first.
async fn pause(shutdown: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
