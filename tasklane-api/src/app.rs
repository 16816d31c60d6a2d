/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasklane_api::{app::AppState, config::Config, middleware::rate_limit::MemoryRateLimitStore};
/// use tasklane_shared::store::memory::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryRateLimitStore::new()),
///     config,
/// );
/// let app = tasklane_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::rate_limit::{rate_limit_layer, RateLimitStore, RateLimiter},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tasklane_shared::auth::identity::authenticate;
use tasklane_shared::services::Services;
use tasklane_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Entity services over the store
    pub services: Services,

    /// Persistence gateway, used directly by the health check
    pub store: Arc<dyn Store>,

    /// Limiter for register and login
    pub auth_limiter: RateLimiter,

    /// Limiter for authenticated routes
    pub api_limiter: RateLimiter,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, rate_limits: Arc<dyn RateLimitStore>, config: Config) -> Self {
        let services = Services::new(store.clone(), &config.jwt.secret, config.token_ttl());

        Self {
            services,
            store,
            auth_limiter: RateLimiter::new("auth", rate_limits.clone(), config.rate_limit.auth),
            api_limiter: RateLimiter::new("api", rate_limits, config.rate_limit.api),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                   # Health check (public)
/// └── /v1/
///     ├── /auth/register, /auth/login           # Public, auth rate tier
///     ├── /users/me                             # Caller profile
///     ├── /subtasks?assigned_to=                # Subtasks by assignee
///     ├── /projects[/:project_id]               # Projects
///     │   ├── /members                          # Member grants
///     │   └── /tasks                            # Tasks of a project
///     └── /tasks/:task_id
///         ├── /complete                         # Toggle completion
///         └── /subtasks[/:subtask_id[/complete]]
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. CORS (tower-http CorsLayer)
/// 2. Logging (tower-http TraceLayer)
/// 3. Request deadline (tower-http TimeoutLayer, 408 on expiry)
/// 4. Rate limiting (per route tier)
/// 5. JWT authentication (`/v1` routes except auth)
pub fn build_router(state: AppState) -> Router {
    // Import route handlers
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, auth tier rate limit)
    let auth_routes = Router::new()
        .route("/v1/auth/register", post(routes::auth::register))
        .route("/v1/auth/login", post(routes::auth::login))
        .route_layer(from_fn_with_state(state.auth_limiter.clone(), rate_limit_layer));

    // Everything else requires a bearer token
    let api_routes = Router::new()
        .route("/v1/users/me", get(routes::users::me).put(routes::users::update_me))
        .route("/v1/subtasks", get(routes::subtasks::assigned))
        .route("/v1/projects", get(routes::projects::list).post(routes::projects::create))
        .route(
            "/v1/projects/:project_id",
            get(routes::projects::get)
                .put(routes::projects::update)
                .delete(routes::projects::delete),
        )
        .route(
            "/v1/projects/:project_id/members",
            get(routes::projects::members).post(routes::projects::add_member),
        )
        .route(
            "/v1/projects/:project_id/tasks",
            get(routes::tasks::list).post(routes::tasks::create),
        )
        .route(
            "/v1/tasks/:task_id",
            get(routes::tasks::get)
                .put(routes::tasks::update)
                .delete(routes::tasks::delete),
        )
        .route("/v1/tasks/:task_id/complete", patch(routes::tasks::toggle_complete))
        .route(
            "/v1/tasks/:task_id/subtasks",
            get(routes::subtasks::list).post(routes::subtasks::create),
        )
        .route(
            "/v1/tasks/:task_id/subtasks/:subtask_id",
            get(routes::subtasks::get)
                .put(routes::subtasks::update)
                .delete(routes::subtasks::delete),
        )
        .route(
            "/v1/tasks/:task_id/subtasks/:subtask_id/complete",
            patch(routes::subtasks::toggle_complete),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_layer))
        .route_layer(from_fn_with_state(state.api_limiter.clone(), rate_limit_layer));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    let timeout = Duration::from_secs(state.config.api.request_timeout_secs);

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .merge(auth_routes)
        .merge(api_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates JWT token from Authorization header,
/// then injects AuthContext into request extensions.
async fn jwt_auth_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_context = authenticate(auth_header, state.jwt_secret())?;

    // Insert into request extensions
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
