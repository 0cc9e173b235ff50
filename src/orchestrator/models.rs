//! Wire types for the orchestrator REST API

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Tasks
// ============================================================================

/// Task as listed by `GET /tasks`
///
/// The worker only ever holds a read-only copy of this for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_summary: Option<String>,
}

impl Task {
    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Open
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Task lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Open,
    Assigned,
    InProgress,
    Blocked,
    Review,
    Delivered,
    /// Anything the orchestrator reports that we don't know about
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Assigned => "assigned",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Review => "review",
            TaskStatus::Delivered => "delivered",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        // Older orchestrators stored "delivered: <summary>"
        if value.starts_with("delivered:") {
            return TaskStatus::Delivered;
        }
        match value.as_str() {
            "open" => TaskStatus::Open,
            "assigned" => TaskStatus::Assigned,
            "in_progress" => TaskStatus::InProgress,
            "blocked" => TaskStatus::Blocked,
            "review" => TaskStatus::Review,
            "delivered" => TaskStatus::Delivered,
            _ => TaskStatus::Other(value),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the first open task in orchestrator order
pub fn first_open_task(tasks: Vec<Task>) -> Option<Task> {
    tasks.into_iter().find(Task::is_open)
}

// ============================================================================
// Registration
// ============================================================================

/// Identity assigned by the orchestrator, held for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerIdentity {
    pub id: String,
    pub name: String,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterBotRequest {
    pub name: String,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterBotResponse {
    #[serde(default)]
    pub id: Option<String>,
}

// ============================================================================
// Claim / status / delivery
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AssignTaskRequest {
    pub task_id: String,
    pub bot_id: String,
}

/// Shared `{ok: bool}` acknowledgement; a missing field counts as `false`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateStatusRequest {
    pub task_id: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliverRequest {
    pub task_id: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntakeTaskRequest {
    pub project_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntakeTaskResponse {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(id: &str, status: &str) -> Task {
        serde_json::from_value(json!({
            "id": id,
            "title": "t",
            "description": "d",
            "status": status,
        }))
        .unwrap()
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(TaskStatus::from("open".to_string()), TaskStatus::Open);
        assert_eq!(
            TaskStatus::from("in_progress".to_string()),
            TaskStatus::InProgress
        );
        assert_eq!(
            TaskStatus::from("delivered: shipped it".to_string()),
            TaskStatus::Delivered
        );
        assert_eq!(
            TaskStatus::from("archived".to_string()),
            TaskStatus::Other("archived".to_string())
        );
    }

    #[test]
    fn test_status_serializes_as_plain_string() {
        let value = serde_json::to_value(TaskStatus::InProgress).unwrap();
        assert_eq!(value, json!("in_progress"));

        let value = serde_json::to_value(TaskStatus::Other("weird".into())).unwrap();
        assert_eq!(value, json!("weird"));
    }

    #[test]
    fn test_task_tolerates_missing_optional_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": "t9",
            "status": "open",
        }))
        .unwrap();

        assert_eq!(task.title, "");
        assert!(task.assignee.is_none());
        assert!(task.is_open());
    }

    #[test]
    fn test_null_title_and_description_become_empty() {
        let task: Task = serde_json::from_value(json!({
            "id": "t3",
            "title": null,
            "description": null,
            "status": "open",
        }))
        .unwrap();

        assert_eq!(task.title, "");
        assert_eq!(task.description, "");
    }

    #[test]
    fn test_first_open_task_keeps_server_order() {
        let tasks = vec![
            task("a", "assigned"),
            task("b", "open"),
            task("c", "open"),
        ];

        let picked = first_open_task(tasks).unwrap();
        assert_eq!(picked.id, "b");
    }

    #[test]
    fn test_first_open_task_none() {
        let tasks = vec![task("a", "delivered"), task("b", "review")];
        assert!(first_open_task(tasks).is_none());
        assert!(first_open_task(Vec::new()).is_none());
    }

    #[test]
    fn test_ack_defaults_to_not_ok() {
        let ack: AckResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!ack.ok);
    }
}
