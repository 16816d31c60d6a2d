/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `APP_ENV`: `development` or `production` (default: development)
/// - `CORS_ORIGINS`: Comma separated origins, `*` for any (default: *)
/// - `REQUEST_TIMEOUT_SECS`: Per-request deadline (default: 10)
/// - `DATABASE_URL`: PostgreSQL connection string, or `DB_HOST`, `DB_PORT`,
///   `DB_USER`, `DB_PASSWORD` and `DB_NAME`
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `RUN_MIGRATIONS`: Apply migrations at startup (default: true)
/// - `JWT_SECRET`: Secret key for JWT signing (required, 32+ characters)
/// - `JWT_EXPIRE_HOURS`: Access token lifetime (default: 24)
/// - `REDIS_URL`: Redis connection string, or `REDIS_HOST`, `REDIS_PORT`,
///   `REDIS_PASSWORD` and `REDIS_DB`
/// - `RATE_LIMIT_AUTH_MAX` / `RATE_LIMIT_AUTH_WINDOW_SECS`: Auth tier (default: 10 per 60s)
/// - `RATE_LIMIT_API_MAX` / `RATE_LIMIT_API_WINDOW_SECS`: API tier (default: 1000 per 180s)
/// - `RUST_LOG`: Log filter, `LOG_FORMAT=json` for JSON lines
///
/// # Example
///
/// ```no_run
/// use tasklane_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tasklane_shared::redis::RedisConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub redis: RedisSettings,
    pub rate_limit: RateLimitConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Whether `APP_ENV` is `production`
    pub production: bool,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Wall-clock limit for a single request
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in hours
    pub expire_hours: i64,
}

/// Redis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

impl RedisSettings {
    pub fn client_config(&self) -> RedisConfig {
        RedisConfig::new(self.url.clone())
    }
}

/// A request budget over a sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_secs: u64,
}

/// Rate limits for the two route tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Register and login
    pub auth: RateLimitPolicy,

    /// Every authenticated route
    pub api: RateLimitPolicy,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - Neither `DATABASE_URL` nor `DB_HOST` is set
    /// - A numeric variable does not parse
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = parse_var("API_PORT", 8080u16)?;
        let production = env::var("APP_ENV").map(|v| v == "production").unwrap_or(false);
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();
        let request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", 10u64)?;

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts()?,
        };
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10u32)?;
        let run_migrations = parse_var("RUN_MIGRATIONS", true)?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        let expire_hours = parse_var("JWT_EXPIRE_HOURS", 24i64)?;

        let redis_url = match env::var("REDIS_URL") {
            Ok(url) => url,
            Err(_) => RedisConfig::url_from_parts(
                &env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
                parse_var("REDIS_PORT", 6379u16)?,
                env::var("REDIS_PASSWORD").ok().as_deref(),
                parse_var("REDIS_DB", 0u32)?,
            ),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                production,
                cors_origins,
                request_timeout_secs,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                run_migrations,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expire_hours,
            },
            redis: RedisSettings { url: redis_url },
            rate_limit: RateLimitConfig {
                auth: RateLimitPolicy {
                    max_requests: parse_var("RATE_LIMIT_AUTH_MAX", 10u32)?,
                    window_secs: parse_var("RATE_LIMIT_AUTH_WINDOW_SECS", 60u64)?,
                },
                api: RateLimitPolicy {
                    max_requests: parse_var("RATE_LIMIT_API_MAX", 1000u32)?,
                    window_secs: parse_var("RATE_LIMIT_API_WINDOW_SECS", 180u64)?,
                },
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Access token lifetime
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.jwt.expire_hours)
    }
}

/// Reads `name`, falling back to `default` when unset
fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn database_url_from_parts() -> anyhow::Result<String> {
    let host = env::var("DB_HOST")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL or DB_HOST environment variable is required"))?;
    let port = parse_var("DB_PORT", 5432u16)?;
    let user = env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = env::var("DB_PASSWORD").unwrap_or_default();
    let name = env::var("DB_NAME").unwrap_or_else(|_| "tasklane".to_string());

    Ok(build_database_url(&host, port, &user, &password, &name))
}

fn build_database_url(host: &str, port: u16, user: &str, password: &str, name: &str) -> String {
    if password.is_empty() {
        format!("postgresql://{}@{}:{}/{}", user, host, port, name)
    } else {
        format!("postgresql://{}:{}@{}:{}/{}", user, password, host, port, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                production: false,
                cors_origins: vec!["*".to_string()],
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
                run_migrations: false,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
                expire_hours: 24,
            },
            redis: RedisSettings {
                url: "redis://localhost:6379".to_string(),
            },
            rate_limit: RateLimitConfig {
                auth: RateLimitPolicy {
                    max_requests: 10,
                    window_secs: 60,
                },
                api: RateLimitPolicy {
                    max_requests: 1000,
                    window_secs: 180,
                },
            },
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_token_ttl() {
        assert_eq!(config().token_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_database_url_from_parts() {
        assert_eq!(
            build_database_url("db", 5432, "app", "", "tasklane"),
            "postgresql://app@db:5432/tasklane"
        );
        assert_eq!(
            build_database_url("db", 6543, "app", "s3cret", "tasklane"),
            "postgresql://app:s3cret@db:6543/tasklane"
        );
    }

    #[test]
    fn test_parse_var_default_and_error() {
        assert_eq!(parse_var("TASKLANE_TEST_UNSET_VARIABLE", 7u32).unwrap(), 7);

        env::set_var("TASKLANE_TEST_BAD_NUMBER", "seven");
        assert!(parse_var("TASKLANE_TEST_BAD_NUMBER", 7u32).is_err());
        env::remove_var("TASKLANE_TEST_BAD_NUMBER");
    }
}
