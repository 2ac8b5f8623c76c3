//! Tasks kept in a flat JSON file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ToolResult;
use crate::json_file::JsonListFile;

pub const DEFAULT_TASKS_FILE: &str = "tasks.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    New,
    InProgress,
    Completed,
}

impl TaskPriority {
    pub const NAMES: &'static str = "LOW, MEDIUM or HIGH";

    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

impl TaskStatus {
    pub const NAMES: &'static str = "NEW, IN_PROGRESS or COMPLETED";

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::New => "NEW",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = ();

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(TaskPriority::Low),
            "MEDIUM" => Ok(TaskPriority::Medium),
            "HIGH" => Ok(TaskPriority::High),
            _ => Err(()),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(TaskStatus::New),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "COMPLETED" => Ok(TaskStatus::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks matching both filters; `None` matches everything.
    async fn list(
        &self,
        priority: Option<TaskPriority>,
        status: Option<TaskStatus>,
    ) -> ToolResult<Vec<Task>>;

    async fn create(
        &self,
        name: String,
        description: String,
        priority: TaskPriority,
        status: TaskStatus,
    ) -> ToolResult<Task>;
}

pub struct JsonTaskStore {
    file: JsonListFile<Task>,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonListFile::new(path),
        }
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn list(
        &self,
        priority: Option<TaskPriority>,
        status: Option<TaskStatus>,
    ) -> ToolResult<Vec<Task>> {
        let tasks = self.file.load().await?;
        Ok(tasks
            .into_iter()
            .filter(|t| priority.is_none_or(|p| t.priority == p))
            .filter(|t| status.is_none_or(|s| t.status == s))
            .collect())
    }

    async fn create(
        &self,
        name: String,
        description: String,
        priority: TaskPriority,
        status: TaskStatus,
    ) -> ToolResult<Task> {
        let task = Task {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            priority,
            status,
        };
        self.file.push(task.clone()).await?;
        tracing::info!(task_id = %task.id, %priority, %status, "created task");
        Ok(task)
    }
}

pub fn format_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found".to_string();
    }
    let lines: Vec<String> = tasks
        .iter()
        .map(|t| {
            format!(
                "- [{}] {} ({} priority, id {})\n  {}",
                t.status, t.name, t.priority, t.id, t.description
            )
        })
        .collect();
    format!("{} tasks:\n{}", tasks.len(), lines.join("\n"))
}

pub fn format_task(task: &Task) -> String {
    format!(
        "Created task '{}' (id {}, priority {}, status {})",
        task.name, task.id, task.priority, task.status
    )
}
