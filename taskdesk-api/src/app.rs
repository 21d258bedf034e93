/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::{app::AppState, config::Config};
/// use taskdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let state = AppState::new(pool, config);
/// let app = taskdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use taskdesk_shared::auth::credentials::{CredentialSettings, Credentials};
use taskdesk_shared::store::{memory::MemoryStore, postgres::PgStore, TaskStore, UserStore};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    middleware::{
        auth::{authorize, require_auth, ADMIN_ONLY},
        error_detail::ErrorDetailLayer,
    },
    routes,
};

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is an `Arc` (or wraps one), so clones are cheap.
#[derive(Clone)]
pub struct AppState {
    /// User persistence
    pub users: Arc<dyn UserStore>,

    /// Task persistence
    pub tasks: Arc<dyn TaskStore>,

    /// Hashing, token issuing and account operations
    pub credentials: Credentials,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn new(db: PgPool, config: Config) -> Self {
        Self::with_store(Arc::new(PgStore::new(db)), config)
    }

    /// State backed by an in-process [`MemoryStore`]
    pub fn in_memory(config: Config) -> Self {
        Self::with_store(Arc::new(MemoryStore::default()), config)
    }

    /// State over any backend implementing both stores
    pub fn with_store<S>(store: Arc<S>, config: Config) -> Self
    where
        S: UserStore + TaskStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let tasks: Arc<dyn TaskStore> = store;

        let settings = CredentialSettings {
            jwt_secret: config.jwt.secret.clone(),
            token_lifetime: chrono::Duration::seconds(config.jwt.expires_in_secs),
            hash_params: config.password,
        };

        Self {
            credentials: Credentials::new(users.clone(), settings),
            users,
            tasks,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /api
/// ├── /auth
/// │   ├── POST   /register        # public
/// │   ├── POST   /login           # public
/// │   ├── GET    /profile         # bearer
/// │   ├── PUT    /profile         # bearer
/// │   ├── GET    /users           # bearer + admin
/// │   ├── PUT    /users/:id       # bearer + admin
/// │   └── DELETE /users/:id       # bearer + admin
/// └── /tasks                      # bearer, owner-scoped
///     ├── GET    /
///     ├── POST   /
///     ├── GET    /:id
///     ├── PUT    /:id
///     └── DELETE /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Error detail (adds `stack` to 500s outside production)
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication and role checks (per-route, via `route_layer`)
///
/// Unmatched paths bypass authentication and reach the 404 fallback; an
/// unsupported method on a known path gets a 405 in the same envelope.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login));

    let user_routes = Router::new()
        .route(
            "/api/auth/profile",
            get(routes::auth::get_profile).put(routes::auth::update_profile),
        )
        .route(
            "/api/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/api/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .route("/api/auth/users", get(routes::auth::list_users))
        .route(
            "/api/auth/users/:id",
            put(routes::auth::update_user).delete(routes::auth::delete_user),
        )
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            authorize(ADMIN_ONLY, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let expose_errors = !state.config.api.production;

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .method_not_allowed_fallback(routes::method_not_allowed)
        .fallback(routes::route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(ErrorDetailLayer::new(expose_errors))
        .with_state(state)
}
