/// API route handlers
///
/// - `auth`: registration, login, profile and admin user management
/// - `tasks`: owner-scoped task CRUD

use axum::{extract::OriginalUri, http::Method};

use crate::error::ApiError;

pub mod auth;
pub mod tasks;

/// Fallback for unmatched routes
pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Route not found - {}", uri))
}

/// Fallback for known paths hit with an unsupported method
pub async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::MethodNotAllowed(format!("Method {} not allowed on {}", method, uri))
}
