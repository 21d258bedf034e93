/// Role-based permission checks
///
/// Authorization always runs after authentication: it inspects the
/// [`AuthContext`] the bearer-token middleware attached and never looks
/// anything up.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::authorization::{require_role, AuthzError};
/// use taskdesk_shared::auth::middleware::AuthContext;
/// use taskdesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let auth = AuthContext { id: Uuid::new_v4(), email: "a@x.com".into(), role: Role::User };
///
/// assert!(require_role(&auth, &[Role::User, Role::Admin]).is_ok());
/// assert!(matches!(
///     require_role(&auth, &[Role::Admin]),
///     Err(AuthzError::Forbidden { role: Role::User })
/// ));
/// ```

use super::middleware::AuthContext;
use crate::models::user::Role;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The caller's role is not in the permitted set
    #[error("User role '{role}' is not authorized to access this route")]
    Forbidden { role: Role },
}

/// Succeeds if the caller's role is one of `allowed`
pub fn require_role(auth: &AuthContext, allowed: &[Role]) -> Result<(), AuthzError> {
    if auth.role.is_one_of(allowed) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden { role: auth.role })
    }
}

/// Shorthand for `require_role(auth, &[Role::Admin])`
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, &[Role::Admin])
}
