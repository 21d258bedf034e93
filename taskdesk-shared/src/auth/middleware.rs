/// Bearer-token authentication
///
/// Extracts `Authorization: Bearer <token>`, validates the token and turns
/// its claims into an [`AuthContext`]. The API's request middleware stores
/// that context as a request extension; handlers read it with
/// `Extension<AuthContext>`.
///
/// Nothing here touches the database: the identity is whatever the token
/// says it is.
///
/// # Example
///
/// ```
/// use axum::http::{header, HeaderMap, HeaderValue};
/// use taskdesk_shared::auth::jwt::validate_token;
/// use taskdesk_shared::auth::middleware::{authenticate, AuthError};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
///
/// let result = authenticate(&headers, |token| validate_token(token, "secret"));
/// assert_eq!(result.unwrap_err(), AuthError::InvalidToken);
/// ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::jwt::{Claims, JwtError};
use crate::models::user::Role;

/// Identity of the authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Why a request was not authenticated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or not a `Bearer` one
    #[error("Not authorized to access this route. Please provide a valid token.")]
    MissingCredentials,

    /// Bad signature, malformed or expired
    #[error("Invalid or expired token")]
    InvalidToken,
}

/// Returns the token of a well-formed `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::MissingCredentials),
    }
}

/// Checks the bearer token with `verify` and resolves the caller's identity
///
/// Expired and invalid tokens are reported identically.
pub fn authenticate<F>(headers: &HeaderMap, verify: F) -> Result<AuthContext, AuthError>
where
    F: FnOnce(&str) -> Result<Claims, JwtError>,
{
    let token = bearer_token(headers)?;

    let claims = verify(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AuthError::InvalidToken
    })?;

    Ok(claims.into())
}
