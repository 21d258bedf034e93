/// Credential store
///
/// Owns user records on top of a [`UserStore`]: it hashes passwords before
/// they are stored, verifies them at login and issues/validates bearer
/// tokens. Nothing outside this type writes to the users table.
///
/// Argon2 is CPU-bound, so hashing and verification run on the blocking
/// thread pool instead of stalling the async workers.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskdesk_shared::auth::credentials::{CredentialSettings, Credentials};
/// use taskdesk_shared::auth::password::HashParams;
/// use taskdesk_shared::models::user::Role;
/// use taskdesk_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = CredentialSettings {
///     hash_params: HashParams { memory_kib: 1024, iterations: 1, parallelism: 1 },
///     ..CredentialSettings::new("a-secret-that-is-at-least-32-bytes!!")
/// };
/// let credentials = Credentials::new(Arc::new(MemoryStore::new()), settings);
///
/// let user = credentials.create("Ada", "ada@example.com", "secret1", Role::User).await?;
/// let token = credentials.issue_token(user.id, &user.email, user.role)?;
/// assert_eq!(credentials.verify_token(&token)?.id, user.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::jwt::{create_token, validate_token, Claims, JwtError, DEFAULT_TOKEN_LIFETIME_SECS};
use super::password::{hash_password, verify_password, HashParams, PasswordError};
use crate::models::user::{CreateUser, Role, UpdateUser, User, UserCredentials};
use crate::store::{StoreError, UserStore};

/// Secrets and cost settings for the credential store
#[derive(Debug, Clone)]
pub struct CredentialSettings {
    /// HS256 signing secret
    pub jwt_secret: String,

    /// Lifetime of issued tokens
    pub token_lifetime: Duration,

    /// Argon2id cost for new hashes
    pub hash_params: HashParams,
}

impl CredentialSettings {
    /// Default lifetime and hash cost with the given secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            hash_params: HashParams::default(),
        }
    }
}

/// Partial user edit with a raw (not yet hashed) password
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    /// True when no field is present
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none() && self.role.is_none()
    }
}

/// User accounts, passwords and tokens
#[derive(Clone)]
pub struct Credentials {
    users: Arc<dyn UserStore>,
    settings: Arc<CredentialSettings>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token_lifetime", &self.settings.token_lifetime)
            .field("hash_params", &self.settings.hash_params)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(users: Arc<dyn UserStore>, settings: CredentialSettings) -> Self {
        Self {
            users,
            settings: Arc::new(settings),
        }
    }

    async fn hash(&self, raw: &str) -> Result<String, PasswordError> {
        let raw = raw.to_owned();
        let params = self.settings.hash_params;

        tokio::task::spawn_blocking(move || hash_password(&raw, &params))
            .await
            .map_err(|e| PasswordError::HashError(format!("Hashing task failed: {}", e)))?
    }

    /// Registers a user, storing only a salted hash of `raw_password`
    ///
    /// # Errors
    ///
    /// `StoreError::DuplicateKey` if the email is already registered.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        raw_password: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let password_hash = self.hash(raw_password).await?;

        let user = self
            .users
            .insert_user(CreateUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Looks up a user together with its hash; login only
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError> {
        self.users.find_credentials_by_email(email).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.users.find_user_by_id(id).await
    }

    /// Checks `raw` against a stored hash
    pub async fn verify_password(&self, raw: &str, hash: &str) -> Result<bool, PasswordError> {
        let raw = raw.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || verify_password(&raw, &hash))
            .await
            .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))?
    }

    /// Signs a token carrying `{id, email, role}`
    pub fn issue_token(&self, id: Uuid, email: &str, role: Role) -> Result<String, JwtError> {
        let claims = Claims::with_expiration(id, email.to_string(), role, self.settings.token_lifetime);
        create_token(&claims, &self.settings.jwt_secret)
    }

    /// Checks signature and expiry
    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        validate_token(token, &self.settings.jwt_secret)
    }

    /// Applies the present fields, re-hashing a new password
    ///
    /// Returns `None` when `changes` is empty or the user does not exist.
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        if changes.is_empty() {
            return Ok(None);
        }

        let password_hash = match changes.password.as_deref() {
            Some(raw) => Some(self.hash(raw).await?),
            None => None,
        };

        let updated = self
            .users
            .update_user(
                id,
                UpdateUser {
                    name: changes.name,
                    email: changes.email,
                    password_hash,
                    role: changes.role,
                },
            )
            .await?;

        if updated.is_some() {
            debug!(user_id = %id, "User updated");
        }
        Ok(updated)
    }

    /// Every user, newest first
    pub async fn list_all(&self) -> Result<Vec<User>, StoreError> {
        self.users.list_users().await
    }

    /// Removes a user; true if one was removed
    pub async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.users.delete_user(id).await?;
        if removed {
            info!(user_id = %id, "User deleted");
        }
        Ok(removed)
    }

    /// Makes sure an admin account with `email` exists
    ///
    /// An existing account keeps its password and is promoted if needed.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        raw_password: &str,
    ) -> Result<User, StoreError> {
        if let Some(existing) = self.find_by_email(email).await? {
            if existing.role == Role::Admin {
                return Ok(existing.into_user());
            }

            let promoted = self
                .update(
                    existing.id,
                    UserChanges {
                        role: Some(Role::Admin),
                        ..Default::default()
                    },
                )
                .await?;

            info!(user_id = %existing.id, "Promoted existing user to admin");
            return Ok(promoted.unwrap_or_else(|| {
                let mut user = existing.into_user();
                user.role = Role::Admin;
                user
            }));
        }

        self.create(name, email, raw_password, Role::Admin).await
    }
}
