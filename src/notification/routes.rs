use axum::{routing::get, Router};

use crate::state::AppState;
use super::notification_handlers::{
    get_notifications, get_recent_notification, get_user_notifications,
};

/// Internal read surface. It trusts the `x-userId` header and is expected
/// to sit behind the task API rather than face clients directly.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/recent", get(get_recent_notification))
        .route("/user/:id", get(get_user_notifications))
}
