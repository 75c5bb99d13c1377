use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, Result},
    middleware::AuthUser,
    notification::notification_dto::{LimitQuery, NotificationListResponse},
    state::AppState,
};
use super::{
    task_dto::{CreateTaskRequest, TaskListResponse, UpdateTaskRequest},
    task_models::Task,
};

/// Notifications shown to the frontend when no limit is given.
const PROXY_DEFAULT_LIMIT: i64 = 20;

/// Tasks the authenticated user assigned or was assigned
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    responses(
        (status = 200, description = "List of tasks", body = TaskListResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn get_my_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<TaskListResponse>> {
    let tasks = state.task_service.list_tasks(user_id).await?;

    Ok(Json(TaskListResponse {
        count: tasks.len(),
        tasks,
    }))
}

/// Create a task assigned by the authenticated user
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let task = state.task_service.create_task(user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 403, description = "Not the assignor or assignee"),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<i32>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>> {
    payload.validate()?;

    let task = state.task_service.update_task(user_id, task_id, payload).await?;

    Ok(Json(task))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 403, description = "Not the assignor or assignee"),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<i32>,
) -> Result<StatusCode> {
    state.task_service.delete_task(user_id, task_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Notifications addressed to the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/tasks/notifications",
    params(LimitQuery),
    responses(
        (status = 200, description = "Notifications, newest first", body = NotificationListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Store unavailable")
    ),
    tag = "tasks",
    security(("bearer_auth" = []))
)]
pub async fn get_my_notifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<NotificationListResponse>> {
    let limit = if query.limit.is_some() {
        query.limit()
    } else {
        PROXY_DEFAULT_LIMIT
    };

    let notifications = state
        .notification_service
        .get_for_recipient(user_id, limit)
        .await
        .map_err(AppError::Retrieval)?;

    Ok(Json(notifications.into()))
}
