use std::sync::Arc;

use crate::error::{AppError, Result};
use super::{
    task_dto::{CreateTaskRequest, UpdateTaskRequest},
    task_event::TaskEventType,
    task_models::Task,
    task_publisher::EventPublisher,
    task_repository::TaskRepository,
};

/// Service layer for task mutations. Every successful create, update and
/// delete is followed by exactly one published event; failed mutations
/// publish nothing.
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
    publisher: EventPublisher,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>, publisher: EventPublisher) -> Self {
        Self { repo, publisher }
    }

    pub async fn list_tasks(&self, user_id: i32) -> Result<Vec<Task>> {
        self.repo.find_for_user(user_id).await
    }

    pub async fn create_task(&self, actor_id: i32, payload: CreateTaskRequest) -> Result<Task> {
        let task = self.repo.create(actor_id, &payload).await?;

        self.publisher
            .publish(TaskEventType::TaskCreated, &task, actor_id);
        Ok(task)
    }

    pub async fn update_task(
        &self,
        actor_id: i32,
        task_id: i32,
        payload: UpdateTaskRequest,
    ) -> Result<Task> {
        let mut task = self.find_owned(actor_id, task_id).await?;
        payload.apply_to(&mut task);

        let task = self
            .repo
            .update(&task)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

        self.publisher
            .publish(TaskEventType::TaskUpdated, &task, actor_id);
        Ok(task)
    }

    pub async fn delete_task(&self, actor_id: i32, task_id: i32) -> Result<()> {
        // Loaded first so the event still carries the task's name and assignee.
        let task = self.find_owned(actor_id, task_id).await?;

        if self.repo.delete(task_id).await? == 0 {
            return Err(AppError::NotFound("Task not found".into()));
        }

        self.publisher
            .publish(TaskEventType::TaskDeleted, &task, actor_id);
        Ok(())
    }

    async fn find_owned(&self, actor_id: i32, task_id: i32) -> Result<Task> {
        let task = self
            .repo
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

        if !task.is_involved(actor_id) {
            return Err(AppError::Forbidden(
                "Only the assignor or assignee may modify this task".into(),
            ));
        }
        Ok(task)
    }
}
