/// Redis client wrapper
///
/// Wraps `redis::aio::ConnectionManager`, which reconnects on its own, and
/// adds bounded connect/PING timeouts. The API uses it as the backing store
/// for request rate limiting.
///
/// # Example
///
/// ```no_run
/// use tasklane_shared::redis::client::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RedisClient::new(RedisConfig::new("redis://localhost:6379/0")).await?;
/// assert!(client.ping().await?);
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Redis client errors
#[derive(Error, Debug)]
pub enum RedisClientError {
    /// Could not reach the server
    #[error("Redis connection error: {0}")]
    ConnectionError(String),

    /// A command failed
    #[error("Redis command error: {0}")]
    CommandError(#[from] RedisError),

    /// Bad URL or settings
    #[error("Redis configuration error: {0}")]
    ConfigError(String),

    /// A bounded operation ran out of time
    #[error("Redis operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Format: `redis://[:password@]host:port[/db]`
    pub url: String,

    /// Seconds allowed for the initial connection
    pub connection_timeout_secs: u64,

    /// Seconds allowed for a health-check PING
    pub command_timeout_secs: u64,
}

impl RedisConfig {
    /// Config for `url` with default timeouts (5s connect, 2s command)
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_timeout_secs: 5,
            command_timeout_secs: 2,
        }
    }

    /// Builds a URL from discrete host/port/password/db parts
    pub fn url_from_parts(host: &str, port: u16, password: Option<&str>, db: u32) -> String {
        match password {
            Some(password) if !password.is_empty() => {
                format!("redis://:{}@{}:{}/{}", password, host, port, db)
            }
            _ => format!("redis://{}:{}/{}", host, port, db),
        }
    }
}

/// Cloneable handle around a shared connection manager
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    config: Arc<RedisConfig>,
}

impl RedisClient {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the connection cannot be
    /// established within `connection_timeout_secs`.
    pub async fn new(config: RedisConfig) -> Result<Self, RedisClientError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| RedisClientError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let timeout = Duration::from_secs(config.connection_timeout_secs);
        let manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| RedisClientError::Timeout(timeout))?
            .map_err(|e| RedisClientError::ConnectionError(e.to_string()))?;

        tracing::info!(url = %sanitize_url(&config.url), "Redis client connected");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Sends PING; true when the server answers PONG
    pub async fn ping(&self) -> Result<bool, RedisClientError> {
        let mut conn = self.manager.clone();
        let timeout = Duration::from_secs(self.config.command_timeout_secs);

        let reply: String = tokio::time::timeout(timeout, redis::cmd("PING").query_async(&mut conn))
            .await
            .map_err(|_| RedisClientError::Timeout(timeout))??;

        if reply == "PONG" {
            Ok(true)
        } else {
            tracing::warn!(reply = %reply, "Unexpected PING reply");
            Ok(false)
        }
    }

    /// Connection handle for issuing commands
    pub fn get_connection(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// Masks credentials in a Redis URL for logging
pub fn sanitize_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_url() {
        assert_eq!(
            sanitize_url("redis://:hunter2@cache:6379/0"),
            "redis://***@cache:6379/0"
        );
        assert_eq!(
            sanitize_url("redis://localhost:6379"),
            "redis://localhost:6379"
        );
    }

    #[test]
    fn test_url_from_parts() {
        assert_eq!(
            RedisConfig::url_from_parts("localhost", 6379, None, 0),
            "redis://localhost:6379/0"
        );
        assert_eq!(
            RedisConfig::url_from_parts("cache", 6380, Some("pw"), 2),
            "redis://:pw@cache:6380/2"
        );
        assert_eq!(
            RedisConfig::url_from_parts("cache", 6380, Some(""), 1),
            "redis://cache:6380/1"
        );
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_ping() {
        let client = RedisClient::new(RedisConfig::new("redis://localhost:6379"))
            .await
            .unwrap();
        assert!(client.ping().await.unwrap());
    }
}
