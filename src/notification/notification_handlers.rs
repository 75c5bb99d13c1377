use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::{AppError, Result},
    state::AppState,
};
use super::notification_dto::{
    actor_from_headers, LimitQuery, NotificationListResponse, RecentNotificationResponse,
    RecentQuery,
};

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "notifications"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Most recent notification, globally or for one actor
///
/// The actor comes from the `x-userId` header, or else the `actor_id` query
/// parameter. An unparsable actor falls back to the global query.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/recent",
    params(
        RecentQuery,
        ("x-userId" = Option<String>, Header, description = "Acting user id")
    ),
    responses(
        (status = 200, description = "Most recent notification, or null", body = RecentNotificationResponse),
        (status = 500, description = "Store unavailable")
    ),
    tag = "notifications"
)]
pub async fn get_recent_notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentNotificationResponse>> {
    let actor = actor_from_headers(&headers).or_else(|| {
        query
            .actor_id
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
    });

    let result = match actor {
        Some(actor_id) => {
            state
                .notification_service
                .get_most_recent_for_actor(actor_id)
                .await
        }
        None => state.notification_service.get_most_recent().await,
    };
    let notification = result.map_err(AppError::Retrieval)?;

    Ok(Json(notification.into()))
}

/// Notifications for a user
///
/// With a valid `x-userId` header, returns notifications that user
/// triggered. Otherwise returns those addressed to `{id}`, falling back to
/// all notifications when `{id}` is not a number.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/user/{id}",
    params(
        ("id" = String, Path, description = "Recipient user id"),
        ("x-userId" = Option<String>, Header, description = "Acting user id"),
        LimitQuery
    ),
    responses(
        (status = 200, description = "Notifications, newest first", body = NotificationListResponse),
        (status = 500, description = "Store unavailable")
    ),
    tag = "notifications"
)]
pub async fn get_user_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<NotificationListResponse>> {
    let limit = query.limit();
    let service = &state.notification_service;

    let result = if let Some(actor_id) = actor_from_headers(&headers) {
        service.get_for_actor(actor_id, limit).await
    } else if let Ok(recipient_id) = user_id.trim().parse::<i32>() {
        service.get_for_recipient(recipient_id, limit).await
    } else {
        service.get_all(limit).await
    };
    let notifications = result.map_err(AppError::Retrieval)?;

    Ok(Json(notifications.into()))
}

/// All live notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(LimitQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = NotificationListResponse),
        (status = 500, description = "Store unavailable")
    ),
    tag = "notifications"
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<NotificationListResponse>> {
    let notifications = state
        .notification_service
        .get_all(query.limit())
        .await
        .map_err(AppError::Retrieval)?;

    Ok(Json(notifications.into()))
}
