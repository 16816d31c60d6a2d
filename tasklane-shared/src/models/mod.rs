/// Database models for Tasklane
///
/// Each model owns its SQL. Services never issue queries directly; they go
/// through the [`Store`](crate::store::Store) trait, whose Postgres
/// implementation delegates to the functions defined here.
///
/// # Models
///
/// - `user`: Registered accounts
/// - `project`: Projects and their single owner
/// - `member`: Non-owner access grants to a project
/// - `task`: Work items inside a project
/// - `subtask`: Child work items of a task
/// - `work`: Status/priority enums and list filters shared by tasks and subtasks

pub mod member;
pub mod project;
pub mod subtask;
pub mod task;
pub mod user;
pub mod work;
