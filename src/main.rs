mod auth;
mod broker;
mod db;
mod error;
mod middleware;
mod notification;
mod routes;
mod state;
mod store;
mod task;

use anyhow::Context;
use broker::{MemoryBroker, MessageBroker, RedisBroker};
use db::{create_pool, run_migrations};
use notification::{Backoff, EventSubscriber, NotificationRepository, NotificationService};
use routes::create_router;
use state::{AppState, Config, NotificationBackend};
use std::sync::Arc;
use store::{KeyValueStore, MemoryStore, RedisStore};
use task::{EventPublisher, PgTaskRepository, TaskService};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,task_notifier=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await.context("failed to run migrations")?;

    let (store, broker): (Arc<dyn KeyValueStore>, Arc<dyn MessageBroker>) =
        match config.notification_backend {
            NotificationBackend::Redis => {
                tracing::info!("Connecting to Redis at {}", config.redis_url);
                let store = RedisStore::connect(&config.redis_url)
                    .await
                    .context("failed to connect notification store")?;
                let broker = RedisBroker::connect(&config.redis_url)
                    .await
                    .context("failed to connect event broker")?;
                let store: Arc<dyn KeyValueStore> = Arc::new(store);
                let broker: Arc<dyn MessageBroker> = Arc::new(broker);
                (store, broker)
            }
            NotificationBackend::Memory => {
                tracing::warn!("Using in-memory notification backend; data is not shared");
                let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
                let broker: Arc<dyn MessageBroker> = Arc::new(MemoryBroker::new());
                (store, broker)
            }
        };

    let publisher = EventPublisher::new(broker.clone(), config.task_events_channel.clone());
    let task_service = TaskService::new(Arc::new(PgTaskRepository::new(db.clone())), publisher);
    let notification_service = NotificationService::new(NotificationRepository::new(store));

    // Start event subscriber
    let shutdown = CancellationToken::new();
    let subscriber = EventSubscriber::new(
        broker,
        notification_service.clone(),
        config.task_events_channel.clone(),
        Backoff::new(config.subscriber_backoff_min, config.subscriber_backoff_max),
    );
    let subscriber_handle = tokio::spawn(subscriber.run(shutdown.clone()));

    let state = AppState {
        config: config.clone(),
        task_service,
        notification_service,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, waiting for event subscriber");
    shutdown.cancel();
    if let Err(e) = subscriber_handle.await {
        tracing::error!("Event subscriber task failed: {:?}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
