/// Error handling for the API server
///
/// Every failure leaves the server through [`ApiError`], which renders the
/// uniform envelope:
///
/// ```json
/// { "success": false, "message": "Validation error", "errors": [{ "field": "title", "message": "Title is required" }] }
/// ```
///
/// Library errors convert with `?`:
///
/// | Source | Status | Message |
/// |---|---|---|
/// | `StoreError::DuplicateKey` | 400 | Duplicate field value entered |
/// | `StoreError::MissingField` | 400 | Required field is missing |
/// | `StoreError::ForeignKey` | 400 | Referenced resource does not exist |
/// | `JwtError::Invalid` | 401 | Invalid token |
/// | `JwtError::Expired` | 401 | Token expired |
/// | `ValidationErrors` | 400 | Validation error + field list |
/// | anything else | 500 | Internal Server Error |
///
/// # Example
///
/// ```
/// use taskdesk_api::error::{ApiError, ApiResult};
///
/// fn find(id: u32) -> ApiResult<&'static str> {
///     match id {
///         1 => Ok("found"),
///         _ => Err(ApiError::NotFound("User not found".to_string())),
///     }
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::auth::authorization::AuthzError;
use taskdesk_shared::auth::jwt::JwtError;
use taskdesk_shared::auth::middleware::AuthError;
use taskdesk_shared::auth::password::PasswordError;
use taskdesk_shared::store::StoreError;
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message used for every unique-constraint failure
pub const DUPLICATE_MESSAGE: &str = "Duplicate field value entered";

/// Message used for every 500
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unauthorized (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Known path, unsupported method (405)
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Uniqueness violation, reported as 400
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Declared validation failure (400)
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500); the detail is never the client message
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationErrorDetail>>,
}

/// Detail of a 500, attached to the response for the detail middleware
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) | ApiError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for a single-field validation failure
    pub fn field(field: &str, message: &str) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, errors, detail) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::MethodNotAllowed(msg) => (msg, None, None),
            ApiError::Conflict(msg) => {
                tracing::debug!(constraint = %msg, "Uniqueness violation");
                (DUPLICATE_MESSAGE.to_string(), None, None)
            }
            ApiError::ValidationError(errors) => {
                ("Validation error".to_string(), Some(errors), None)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (INTERNAL_MESSAGE.to_string(), None, Some(msg))
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            errors,
        });

        let mut response = (status, body).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(InternalErrorDetail(detail));
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(constraint) => ApiError::Conflict(constraint),
            StoreError::MissingField(_) => {
                ApiError::BadRequest("Required field is missing".to_string())
            }
            StoreError::ForeignKey(_) => {
                ApiError::BadRequest("Referenced resource does not exist".to_string())
            }
            StoreError::Password(err) => err.into(),
            StoreError::Database(err) => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::Invalid(_) => ApiError::Unauthorized("Invalid token".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                // Struct-level rules report under `__all__`
                let field = match field {
                    "__all__" => "body".to_string(),
                    other => other.to_string(),
                };
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();

        // HashMap order is arbitrary
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}
