use anyhow::{anyhow, Context};
use std::sync::Arc;
use std::time::Duration;

use crate::{notification::NotificationService, task::TaskService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub task_service: TaskService,
    pub notification_service: NotificationService,
}

/// Where notification records and task events live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationBackend {
    Redis,
    /// In-process store and broker; single-node only.
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub notification_backend: NotificationBackend,
    pub redis_url: String,
    pub task_events_channel: String,
    pub subscriber_backoff_min: Duration,
    pub subscriber_backoff_max: Duration,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(key, default)
        .parse()
        .with_context(|| format!("{} must be a number", key))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let notification_backend = match var_or("NOTIFICATION_BACKEND", "redis").as_str() {
            "redis" => NotificationBackend::Redis,
            "memory" => NotificationBackend::Memory,
            other => return Err(anyhow!("unknown NOTIFICATION_BACKEND: {}", other)),
        };

        Ok(Self {
            host: var_or("HOST", "127.0.0.1"),
            port: parse_var("PORT", "3000")?,
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            notification_backend,
            redis_url: var_or("REDIS_URL", "redis://127.0.0.1:6379"),
            task_events_channel: var_or("TASK_EVENTS_CHANNEL", "task_events"),
            subscriber_backoff_min: Duration::from_millis(parse_var(
                "SUBSCRIBER_BACKOFF_MIN_MS",
                "100",
            )?),
            subscriber_backoff_max: Duration::from_millis(parse_var(
                "SUBSCRIBER_BACKOFF_MAX_MS",
                "30000",
            )?),
        })
    }
}
