/// Database models for TaskDesk
///
/// # Models
///
/// - `user`: User accounts and roles
/// - `task`: Owner-scoped to-do items, filters and partial updates

pub mod user;
pub mod task;
