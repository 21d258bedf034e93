/// Middleware modules for the API server
///
/// - `auth`: bearer-token authentication and role checks
/// - `error_detail`: exposes internal error detail outside production

pub mod auth;
pub mod error_detail;
