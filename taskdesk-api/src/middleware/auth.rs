/// Access-control middleware
///
/// [`require_auth`] authenticates the bearer token and attaches an
/// [`AuthContext`]; [`authorize`] then checks the attached role. Both are
/// installed with `route_layer`, authentication outermost, so a role check
/// never runs on an unauthenticated request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskdesk_shared::auth::authorization::require_role;
use taskdesk_shared::auth::middleware::{authenticate, AuthContext, AuthError};
use taskdesk_shared::models::user::Role;

use crate::app::AppState;
use crate::error::ApiError;

/// Roles allowed on admin-only routes
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Rejects requests without a valid bearer token
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(req.headers(), |token| state.credentials.verify_token(token))?;

    tracing::debug!(user_id = %auth.id, role = %auth.role, "Authenticated request");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Rejects requests whose role is not in `allowed`
///
/// ```no_run
/// use axum::{extract::Request, middleware::{self, Next}, routing::get, Router};
/// use taskdesk_api::middleware::auth::{authorize, ADMIN_ONLY};
///
/// let admin: Router = Router::new()
///     .route("/users", get(|| async { "ok" }))
///     .route_layer(middleware::from_fn(|req: Request, next: Next| authorize(ADMIN_ONLY, req, next)));
/// ```
pub async fn authorize(
    allowed: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(AuthError::MissingCredentials)?;

    require_role(auth, allowed)?;

    Ok(next.run(req).await)
}
