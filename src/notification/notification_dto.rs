use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{
    notification_models::{Notification, NotificationView},
    notification_service::DEFAULT_LIMIT,
};

/// Header carrying the acting user's id (sent as `x-userId`; header names
/// are case-insensitive).
pub const USER_ID_HEADER: &str = "x-userid";

/// Kept as raw strings so malformed values degrade to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum number of notifications (1-200, default 50)
    pub limit: Option<String>,
}

impl LimitQuery {
    pub fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Restrict to notifications this user triggered
    pub actor_id: Option<String>,
}

/// The actor id from the `x-userId` header, if present and numeric.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<i32> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.trim().parse().ok())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentNotificationResponse {
    pub recent_notification: Option<NotificationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Option<Notification>> for RecentNotificationResponse {
    fn from(notification: Option<Notification>) -> Self {
        match notification {
            Some(n) => Self {
                recent_notification: Some(n.into()),
                message: None,
            },
            None => Self {
                recent_notification: None,
                message: Some("no recent notifications found".to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationView>,
    pub count: usize,
}

impl From<Vec<Notification>> for NotificationListResponse {
    fn from(notifications: Vec<Notification>) -> Self {
        let notifications: Vec<NotificationView> =
            notifications.into_iter().map(Into::into).collect();
        Self {
            count: notifications.len(),
            notifications,
        }
    }
}
