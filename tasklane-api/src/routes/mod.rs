/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `users`: The caller's profile
/// - `projects`: Projects and member grants
/// - `tasks`: Tasks and task completion
/// - `subtasks`: Subtasks, subtask completion and assignee listing

pub mod auth;
pub mod health;
pub mod projects;
pub mod subtasks;
pub mod tasks;
pub mod users;

use serde::Serialize;

/// Body returned by deletes and grants
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
