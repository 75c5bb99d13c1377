use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use super::{
    task_dto::CreateTaskRequest,
    task_models::{Task, TaskStatus},
};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, assigned_by: i32, payload: &CreateTaskRequest) -> Result<Task>;

    /// Persist every mutable field of `task`. `None` when the row is gone.
    async fn update(&self, task: &Task) -> Result<Option<Task>>;

    async fn delete(&self, id: i32) -> Result<u64>;

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>>;

    /// Tasks the user assigned or was assigned, newest first.
    async fn find_for_user(&self, user_id: i32) -> Result<Vec<Task>>;
}

#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, assigned_by: i32, payload: &CreateTaskRequest) -> Result<Task> {
        let status = payload.task_status.unwrap_or(TaskStatus::Pending);

        let task = sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (name, description, assigned_by, assigned_to, task_status, priority, deadline)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *"
        )
        .bind(&payload.name)
        .bind(payload.description.as_deref())
        .bind(assigned_by)
        .bind(payload.assigned_to)
        .bind(status.to_string())
        .bind(payload.priority.unwrap_or(0))
        .bind(payload.deadline)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            "UPDATE tasks
             SET name = $1, description = $2, assigned_to = $3, task_status = $4, priority = $5, deadline = $6
             WHERE id = $7
             RETURNING *"
        )
        .bind(&task.name)
        .bind(task.description.as_deref())
        .bind(task.assigned_to)
        .bind(&task.task_status)
        .bind(task.priority)
        .bind(task.deadline)
        .bind(task.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete(&self, id: i32) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_for_user(&self, user_id: i32) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE assigned_to = $1 OR assigned_by = $1 ORDER BY created_at DESC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }
}
