/// Status, priority and list filters shared by tasks and subtasks
///
/// Both work item tables use the same PostgreSQL enum types:
///
/// ```sql
/// CREATE TYPE work_status AS ENUM ('todo', 'in_progress', 'completed');
/// CREATE TYPE work_priority AS ENUM ('low', 'medium', 'high');
/// ```
///
/// There is no stored `completed` flag. Completion is always derived from
/// the status via [`WorkStatus::is_completed`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a task or subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Not started
    Todo,

    /// Being worked on
    InProgress,

    /// Done
    Completed,
}

impl WorkStatus {
    /// Converts status to its database/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Todo => "todo",
            WorkStatus::InProgress => "in_progress",
            WorkStatus::Completed => "completed",
        }
    }

    /// Whether this status counts as completed
    pub fn is_completed(&self) -> bool {
        matches!(self, WorkStatus::Completed)
    }

    /// Status after a completion toggle
    ///
    /// A completed item goes back to `reopened`; anything else becomes
    /// completed. Tasks reopen to `todo`, subtasks to `in_progress`.
    pub fn toggled(self, reopened: WorkStatus) -> WorkStatus {
        if self.is_completed() {
            reopened
        } else {
            WorkStatus::Completed
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(WorkStatus::Todo),
            "in_progress" => Ok(WorkStatus::InProgress),
            "completed" => Ok(WorkStatus::Completed),
            other => Err(format!(
                "invalid status '{}', expected one of: todo, in_progress, completed",
                other
            )),
        }
    }
}

/// Priority of a task or subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Converts priority to its database/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "invalid priority '{}', expected one of: low, medium, high",
                other
            )),
        }
    }
}

/// Optional equality filters applied when listing tasks or subtasks
///
/// `None` means "any value".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkFilter {
    pub status: Option<WorkStatus>,
    pub priority: Option<Priority>,
}

impl WorkFilter {
    /// Returns true when the given status/priority pass this filter
    pub fn matches(&self, status: WorkStatus, priority: Option<Priority>) -> bool {
        let status_ok = self.status.map_or(true, |wanted| wanted == status);
        let priority_ok = self.priority.map_or(true, |wanted| Some(wanted) == priority);
        status_ok && priority_ok
    }
}
