/// Account endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register and get a token
/// - `POST /api/auth/login` - Exchange credentials for a token
/// - `GET /api/auth/profile` - Current user (bearer)
/// - `PUT /api/auth/profile` - Edit own name/email/password (bearer)
/// - `GET /api/auth/users` - All users (admin)
/// - `PUT /api/auth/users/:id` - Edit any user, including role (admin)
/// - `DELETE /api/auth/users/:id` - Delete a user and their tasks (admin)

use axum::{
    extract::{Path, State},
    Extension,
};
use serde::{Deserialize, Serialize};
use taskdesk_shared::auth::credentials::UserChanges;
use taskdesk_shared::auth::middleware::AuthContext;
use taskdesk_shared::models::user::{Role, User};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::Envelope,
    validation::{at_least_one, not_empty, one_of, ValidatedJson},
};

const USER_NOT_FOUND: &str = "User not found";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const ROLE_MESSAGE: &str = "Role must be one of: user, admin";

/// Register request
///
/// `role` is accepted and checked but never honoured: self-registration
/// always creates a `user`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "Name is required"),
        custom(function = "not_empty", message = "Name is required"),
        length(max = 255, message = "Name must not exceed 255 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Email must be a valid email address")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters long")
    )]
    pub password: Option<String>,

    #[validate(custom(function = "known_role"))]
    pub role: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "Email is required"),
        email(message = "Email must be a valid email address")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        custom(function = "not_empty", message = "Password is required")
    )]
    pub password: Option<String>,
}

/// Self-service profile edit; `role` is not accepted here
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "profile_has_changes"))]
pub struct UpdateProfileRequest {
    #[validate(
        custom(function = "not_empty", message = "Name cannot be empty"),
        length(max = 255, message = "Name must not exceed 255 characters")
    )]
    pub name: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
}

fn profile_has_changes(req: &UpdateProfileRequest) -> Result<(), ValidationError> {
    at_least_one(req.name.is_some() || req.email.is_some() || req.password.is_some())
}

impl From<UpdateProfileRequest> for UserChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        UserChanges {
            name: req.name,
            email: req.email,
            password: req.password,
            role: None,
        }
    }
}

/// Admin edit of any account
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "user_has_changes"))]
pub struct UpdateUserRequest {
    #[validate(
        custom(function = "not_empty", message = "Name cannot be empty"),
        length(max = 255, message = "Name must not exceed 255 characters")
    )]
    pub name: Option<String>,

    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,

    #[validate(custom(function = "known_role"))]
    pub role: Option<String>,
}

fn user_has_changes(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    at_least_one(
        req.name.is_some() || req.email.is_some() || req.password.is_some() || req.role.is_some(),
    )
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role.and_then(|r| r.parse().ok()),
        }
    }
}

fn known_role(role: &str) -> Result<(), ValidationError> {
    one_of(role, &Role::ALL.map(|r| r.as_str()), ROLE_MESSAGE)
}

/// User plus a fresh token
#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

/// Path ids that are not UUIDs cannot match any row
fn parse_user_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(USER_NOT_FOUND.to_string()))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// { "name": "Ada", "email": "ada@example.com", "password": "secret1" }
/// ```
///
/// # Response (201)
///
/// ```json
/// {
///   "success": true,
///   "message": "User registered successfully",
///   "data": { "user": { "id": "uuid", "name": "Ada", "email": "ada@example.com", "role": "user", ... }, "token": "eyJ..." }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, or the email is taken
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<Envelope<AuthPayload>> {
    let (Some(name), Some(email), Some(password)) = (req.name, req.email, req.password) else {
        return Err(ApiError::BadRequest("Name, email and password are required".to_string()));
    };

    let user = state
        .credentials
        .create(&name, &email, &password, Role::User)
        .await?;

    let token = state.credentials.issue_token(user.id, &user.email, user.role)?;

    Ok(Envelope::created(AuthPayload { user, token }).with_message("User registered successfully"))
}

/// Log in
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Envelope<AuthPayload>> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let Some(record) = state.credentials.find_by_email(&email).await? else {
        tracing::debug!("Login for unknown email");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !state
        .credentials
        .verify_password(&password, &record.password_hash)
        .await?
    {
        tracing::debug!(user_id = %record.id, "Login with wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let user = record.into_user();
    let token = state.credentials.issue_token(user.id, &user.email, user.role)?;

    Ok(Envelope::ok(AuthPayload { user, token }).with_message("Login successful"))
}

/// Current user's profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Envelope<User>> {
    let user = state
        .credentials
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    Ok(Envelope::ok(user))
}

/// Update the current user's name, email or password
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Envelope<User>> {
    let user = state
        .credentials
        .update(auth.id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    Ok(Envelope::ok(user).with_message("Profile updated successfully"))
}

/// All users, newest first (admin)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Envelope<Vec<User>>> {
    let users = state.credentials.list_all().await?;
    let count = users.len();

    Ok(Envelope::ok(users).with_count(count))
}

/// Edit any user (admin)
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Envelope<User>> {
    let id = parse_user_id(&id)?;

    let user = state
        .credentials
        .update(id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    Ok(Envelope::ok(user).with_message("User updated successfully"))
}

/// Delete a user and, by cascade, their tasks (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Envelope<()>> {
    let id = parse_user_id(&id)?;

    if !state.credentials.delete(id).await? {
        return Err(ApiError::NotFound(USER_NOT_FOUND.to_string()));
    }

    Ok(Envelope::message("User deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationErrors;

    fn fields(result: Result<(), ValidationErrors>) -> Vec<String> {
        let mut fields: Vec<String> = result
            .unwrap_err()
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        fields
    }

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: None,
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register("A", "a@x.com", "secret1").validate().is_ok());

        assert_eq!(fields(register("", "bad", "123").validate()), vec!["email", "name", "password"]);

        let missing = RegisterRequest {
            name: None,
            email: None,
            password: None,
            role: None,
        };
        assert_eq!(fields(missing.validate()), vec!["email", "name", "password"]);
    }

    #[test]
    fn test_register_role_checked() {
        let mut req = register("Ada", "a@x.com", "secret1");
        req.role = Some("admin".to_string());
        assert!(req.validate().is_ok());

        req.role = Some("root".to_string());
        assert_eq!(fields(req.validate()), vec!["role"]);
    }

    #[test]
    fn test_login_validation() {
        let ok = LoginRequest {
            email: Some("a@x.com".to_string()),
            password: Some("x".to_string()),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: Some("nope".to_string()),
            password: None,
        };
        assert_eq!(fields(bad.validate()), vec!["email", "password"]);
    }

    #[test]
    fn test_profile_update_requires_a_field() {
        let empty = UpdateProfileRequest {
            name: None,
            email: None,
            password: None,
        };
        assert_eq!(fields(empty.validate()), vec!["__all__"]);

        let short = UpdateProfileRequest {
            name: None,
            email: None,
            password: Some("123".to_string()),
        };
        assert_eq!(fields(short.validate()), vec!["password"]);
    }

    #[test]
    fn test_register_messages() {
        let errors = register("x".repeat(256).as_str(), "a@x.com", "123")
            .validate()
            .unwrap_err();
        let errors = errors.field_errors();
        assert_eq!(
            errors["name"][0].message.as_deref(),
            Some("Name must not exceed 255 characters")
        );
        assert_eq!(
            errors["password"][0].message.as_deref(),
            Some("Password must be at least 6 characters long")
        );
    }

    #[test]
    fn test_profile_update_field_errors_skip_schema() {
        let req = UpdateProfileRequest {
            name: Some(String::new()),
            email: None,
            password: None,
        };
        assert_eq!(fields(req.validate()), vec!["name"]);
    }

    #[test]
    fn test_admin_update_role_parsed() {
        let req = UpdateUserRequest {
            name: None,
            email: None,
            password: None,
            role: Some("admin".to_string()),
        };
        assert!(req.validate().is_ok());

        let changes: UserChanges = req.into();
        assert_eq!(changes.role, Some(Role::Admin));
    }
}
