use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::task_models::{Task, TaskStatus};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub assigned_to: i32,
    pub task_status: Option<TaskStatus>,
    #[validate(range(min = 0))]
    pub priority: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub assigned_to: Option<i32>,
    pub task_status: Option<TaskStatus>,
    #[validate(range(min = 0))]
    pub priority: Option<i32>,
    pub deadline: Option<DateTime<Utc>>,
}

impl UpdateTaskRequest {
    /// Overlay the provided fields on `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(assigned_to) = self.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(status) = self.task_status {
            task.task_status = status.to_string();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = Some(deadline);
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub count: usize,
}
