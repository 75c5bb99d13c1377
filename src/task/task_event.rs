use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task_models::Task;

/// Lifecycle change carried by a [`TaskEvent`].
///
/// Serialized as its wire string. Strings outside the known set are kept
/// verbatim in `Other` so consumers can still describe them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskEventType {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    Other(String),
}

impl TaskEventType {
    pub fn as_str(&self) -> &str {
        match self {
            TaskEventType::TaskCreated => "task_created",
            TaskEventType::TaskUpdated => "task_updated",
            TaskEventType::TaskDeleted => "task_deleted",
            TaskEventType::Other(action) => action,
        }
    }
}

impl From<String> for TaskEventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "task_created" => TaskEventType::TaskCreated,
            "task_updated" => TaskEventType::TaskUpdated,
            "task_deleted" => TaskEventType::TaskDeleted,
            _ => TaskEventType::Other(value),
        }
    }
}

impl From<TaskEventType> for String {
    fn from(value: TaskEventType) -> Self {
        match value {
            TaskEventType::Other(action) => action,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TaskEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire message published once per successful task mutation. Immutable once
/// published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub event_type: TaskEventType,
    pub task_id: i32,
    pub task_name: String,
    /// Recipient of the resulting notification.
    pub assigned_to: i32,
    /// Actor who performed the mutation.
    pub assigned_by: i32,
    pub timestamp: DateTime<Utc>,
}

impl TaskEvent {
    /// `actor_id` is the user performing the mutation, which for updates and
    /// deletes need not be the task's original assignor.
    pub fn new(event_type: TaskEventType, task: &Task, actor_id: i32) -> Self {
        Self {
            event_type,
            task_id: task.id,
            task_name: task.name.clone(),
            assigned_to: task.assigned_to,
            assigned_by: actor_id,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_wire_strings() {
        assert_eq!(
            serde_json::to_value(TaskEventType::TaskCreated).unwrap(),
            json!("task_created")
        );
        assert_eq!(
            serde_json::from_value::<TaskEventType>(json!("task_deleted")).unwrap(),
            TaskEventType::TaskDeleted
        );
        assert_eq!(
            serde_json::from_value::<TaskEventType>(json!("task_archived")).unwrap(),
            TaskEventType::Other("task_archived".into())
        );
    }

    #[test]
    fn test_decode_wire_event() {
        let event: TaskEvent = serde_json::from_value(json!({
            "event_type": "task_created",
            "task_id": 7,
            "task_name": "Ship release",
            "assigned_to": 42,
            "assigned_by": 1,
            "timestamp": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(event.event_type, TaskEventType::TaskCreated);
        assert_eq!(event.task_id, 7);
        assert_eq!(event.assigned_to, 42);
        assert_eq!(event.assigned_by, 1);
    }

    #[test]
    fn test_missing_task_id_is_rejected() {
        let result = serde_json::from_value::<TaskEvent>(json!({
            "event_type": "task_created",
            "task_name": "Ship release",
            "assigned_to": 42,
            "assigned_by": 1,
            "timestamp": "2024-05-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }
}
