//! # Tasklane API Server
//!
//! Multi-tenant task management over HTTP. Projects belong to an owner and
//! may be shared with members; tasks and subtasks live inside projects, and a
//! task completes itself once all of its subtasks are done.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) DATABASE_URL=postgresql://localhost/tasklane \
//!     cargo run -p tasklane-api
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tasklane_api::app::{build_router, AppState};
use tasklane_api::config::Config;
use tasklane_api::middleware::rate_limit::RedisRateLimitStore;
use tasklane_shared::db::migrations::{ensure_database_exists, run_migrations};
use tasklane_shared::db::pool::{create_pool, DatabaseConfig};
use tasklane_shared::redis::RedisClient;
use tasklane_shared::store::postgres::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Tasklane API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    ensure_database_exists(&config.database.url)
        .await
        .context("failed to create database")?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("failed to connect to database")?;

    if config.database.run_migrations {
        run_migrations(&pool).await.context("failed to run migrations")?;
    }

    let redis = RedisClient::new(config.redis.client_config())
        .await
        .context("failed to connect to Redis")?;

    let bind_address = config.bind_address();
    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(RedisRateLimitStore::new(redis)),
        config,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tasklane_api=debug,tasklane_shared=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
