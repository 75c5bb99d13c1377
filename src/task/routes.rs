use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use crate::{middleware::auth_middleware, state::AppState};
use super::task_handlers::{
    create_task, delete_task, get_my_notifications, get_my_tasks, update_task,
};

pub fn task_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_my_tasks).post(create_task))
        .route("/notifications", get(get_my_notifications))
        .route("/:id", put(update_task).delete(delete_task))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
