/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and verification
/// - [`jwt`]: HS256 bearer tokens carrying `{id, email, role}`
/// - [`credentials`]: the credential store that ties both to user records
/// - [`middleware`]: bearer-token extraction into an [`middleware::AuthContext`]
/// - [`authorization`]: role checks on an authenticated context
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::{create_token, validate_token, Claims};
/// use taskdesk_shared::auth::password::{hash_password, verify_password, HashParams};
/// use taskdesk_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let params = HashParams { memory_kib: 1024, iterations: 1, parallelism: 1 };
/// let hash = hash_password("user_password", &params)?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "a@x.com".to_string(), Role::User);
/// let token = create_token(&claims, "secret-key")?;
/// assert_eq!(validate_token(&token, "secret-key")?.email, "a@x.com");
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
