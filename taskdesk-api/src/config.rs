/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is
/// honoured in development) into a typed [`Config`].
///
/// # Environment Variables
///
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 3000)
/// - `APP_ENV`: `production` hides internal error detail (default: development)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for any (default: *)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: HS256 secret, at least 32 characters (required)
/// - `JWT_EXPIRE`: token lifetime such as `7d`, `12h`, `30m` (default: 7d)
/// - `PASSWORD_MEMORY_KIB`, `PASSWORD_ITERATIONS`, `PASSWORD_PARALLELISM`: Argon2id cost
/// - `TASKS_MAX_PAGE_LIMIT`: optional cap on `limit` for task listings
/// - `ADMIN_NAME`, `ADMIN_EMAIL`, `ADMIN_PASSWORD`: admin account ensured at startup
/// - `RUST_LOG`, `LOG_FORMAT`: read by the logging setup in `main`
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use taskdesk_shared::auth::jwt::DEFAULT_TOKEN_LIFETIME_SECS;
use taskdesk_shared::auth::password::HashParams;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Argon2id cost for new password hashes
    pub password: HashParams,

    /// Task listing limits
    pub tasks: TasksConfig,

    /// Admin account to ensure at startup
    pub admin: Option<AdminConfig>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode: internal error detail is never sent to clients
    pub production: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in seconds
    pub expires_in_secs: i64,
}

/// Task listing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Largest `limit` a listing may request; `None` means unbounded
    pub max_page_limit: Option<i64>,
}

/// Bootstrap admin account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - `JWT_SECRET` is shorter than 32 characters
    /// - a numeric or duration variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(get("API_PORT"), "API_PORT", 3000u16)?;

        let production = get("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 10u32)?;

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expires_in_secs = match get("JWT_EXPIRE") {
            Some(raw) => parse_duration_secs(&raw)
                .map_err(|e| anyhow::anyhow!("JWT_EXPIRE: {}", e))?,
            None => DEFAULT_TOKEN_LIFETIME_SECS,
        };

        let defaults = HashParams::default();
        let password = HashParams {
            memory_kib: parse_or(get("PASSWORD_MEMORY_KIB"), "PASSWORD_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(get("PASSWORD_ITERATIONS"), "PASSWORD_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(get("PASSWORD_PARALLELISM"), "PASSWORD_PARALLELISM", defaults.parallelism)?,
        };

        let max_page_limit = match get("TASKS_MAX_PAGE_LIMIT") {
            Some(raw) => {
                let cap: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("TASKS_MAX_PAGE_LIMIT: {}", e))?;
                if cap < 1 {
                    anyhow::bail!("TASKS_MAX_PAGE_LIMIT must be at least 1");
                }
                Some(cap)
            }
            None => None,
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminConfig {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Admin User".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_secs,
            },
            password,
            tasks: TasksConfig { max_page_limit },
            admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{}: {}", key, e)),
        None => Ok(default),
    }
}

/// Parses `<n>[s|m|h|d]` into seconds; a bare number is seconds
///
/// ```
/// use taskdesk_api::config::parse_duration_secs;
///
/// assert_eq!(parse_duration_secs("7d").unwrap(), 604_800);
/// assert_eq!(parse_duration_secs("90").unwrap(), 90);
/// ```
pub fn parse_duration_secs(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c.to_ascii_lowercase()),
        _ => (raw, 's'),
    };

    let amount: i64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{}'", raw))?;
    if amount <= 0 {
        return Err(format!("duration must be positive, got '{}'", raw));
    }

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        other => return Err(format!("unknown duration unit '{}'", other)),
    };

    amount
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration '{}' is too large", raw))
}
