/// Sliding-window rate limiting
///
/// Every request is recorded as a timestamped entry under
/// `ratelimit:{scope}:{client}`. Entries older than the window are trimmed,
/// the rest are counted, and the request is rejected once the count reaches
/// the policy maximum.
///
/// # Tiers
///
/// - **auth**: register and login (default 10 requests per 60 seconds)
/// - **api**: every authenticated route (default 1000 requests per 180 seconds)
///
/// # Storage
///
/// [`RedisRateLimitStore`] keeps each window in a sorted set scored by
/// milliseconds (`ZREMRANGEBYSCORE`, `ZCARD`, `ZADD`, `EXPIRE`). The key
/// expires one window after the last request. [`MemoryRateLimitStore`] is
/// used by tests.
///
/// Trimming, counting and appending are separate round trips, so concurrent
/// requests from one client can overshoot the limit slightly. The limit is a
/// soft ceiling.
///
/// # Headers
///
/// - `X-RateLimit-Limit`: Requests allowed per window
/// - `X-RateLimit-Remaining`: Requests left in the current window
/// - `X-RateLimit-Reset`: Unix timestamp when the oldest entry leaves the window
/// - `Retry-After`: Seconds to wait (429 responses only)
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasklane_api::config::RateLimitPolicy;
/// use tasklane_api::middleware::rate_limit::{rate_limit_layer, MemoryRateLimitStore, RateLimiter};
/// use axum::{routing::get, Router};
///
/// let limiter = RateLimiter::new(
///     "auth",
///     Arc::new(MemoryRateLimitStore::new()),
///     RateLimitPolicy { max_requests: 10, window_secs: 60 },
/// );
///
/// let app: Router = Router::new()
///     .route("/login", get(|| async { "ok" }))
///     .route_layer(axum::middleware::from_fn_with_state(limiter, rate_limit_layer));
/// ```

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tasklane_shared::redis::RedisClient;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::RateLimitPolicy;
use crate::error::ApiError;

/// Rate limit storage failures
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Entries currently inside a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u64,

    /// Timestamp (ms) of the oldest remaining entry
    pub oldest_ms: Option<u64>,
}

/// Backing store for request windows
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Removes entries at or before `cutoff_ms` and counts what is left
    async fn trim_and_count(&self, key: &str, cutoff_ms: u64) -> Result<WindowCount, RateLimitError>;

    /// Records a request at `now_ms`; the key may be dropped after `ttl`
    async fn append(&self, key: &str, now_ms: u64, ttl: Duration) -> Result<(), RateLimitError>;
}

/// Redis sorted-set store
#[derive(Clone)]
pub struct RedisRateLimitStore {
    client: RedisClient,
}

impl RedisRateLimitStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn trim_and_count(&self, key: &str, cutoff_ms: u64) -> Result<WindowCount, RateLimitError> {
        let mut conn = self.client.get_connection();

        let (count, oldest): (u64, Vec<(String, f64)>) = redis::pipe()
            .zrembyscore(key, "-inf", cutoff_ms)
            .ignore()
            .zcard(key)
            .zrange_withscores(key, 0, 0)
            .query_async(&mut conn)
            .await?;

        Ok(WindowCount {
            count,
            oldest_ms: oldest.first().map(|(_, score)| *score as u64),
        })
    }

    async fn append(&self, key: &str, now_ms: u64, ttl: Duration) -> Result<(), RateLimitError> {
        let mut conn = self.client.get_connection();
        let member = format!("{}-{}", now_ms, Uuid::new_v4());

        redis::pipe()
            .zadd(key, member, now_ms)
            .ignore()
            .expire(key, ttl.as_secs().max(1) as i64)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(())
    }
}

/// In-process store; windows are trimmed on access and dropped once empty
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: Mutex<HashMap<String, VecDeque<u64>>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn trim_and_count(&self, key: &str, cutoff_ms: u64) -> Result<WindowCount, RateLimitError> {
        let mut windows = self.windows.lock().await;
        let Some(entries) = windows.get_mut(key) else {
            return Ok(WindowCount {
                count: 0,
                oldest_ms: None,
            });
        };

        while entries.front().is_some_and(|&ts| ts <= cutoff_ms) {
            entries.pop_front();
        }

        let window = WindowCount {
            count: entries.len() as u64,
            oldest_ms: entries.front().copied(),
        };
        if entries.is_empty() {
            windows.remove(key);
        }

        Ok(window)
    }

    async fn append(&self, key: &str, now_ms: u64, _ttl: Duration) -> Result<(), RateLimitError> {
        self.windows
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .push_back(now_ms);
        Ok(())
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u64, reset_at: u64 },
    Limited { retry_after: u64, reset_at: u64 },
}

/// A policy applied to one route tier
#[derive(Clone)]
pub struct RateLimiter {
    scope: &'static str,
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(scope: &'static str, store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { scope, store, policy }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Checks and, when allowed, records a request from `client`
    pub async fn check(&self, client: &str) -> Result<RateLimitDecision, RateLimitError> {
        self.check_at(client, Utc::now().timestamp_millis().max(0) as u64).await
    }

    async fn check_at(&self, client: &str, now_ms: u64) -> Result<RateLimitDecision, RateLimitError> {
        let key = format!("ratelimit:{}:{}", self.scope, client);
        let window_ms = self.policy.window_secs * 1000;
        let cutoff_ms = now_ms.saturating_sub(window_ms);

        let window = self.store.trim_and_count(&key, cutoff_ms).await?;
        let oldest_ms = window.oldest_ms.unwrap_or(now_ms);
        let reset_ms = oldest_ms + window_ms;
        let reset_at = reset_ms.div_ceil(1000);

        if window.count >= u64::from(self.policy.max_requests) {
            let retry_after = reset_ms.saturating_sub(now_ms).div_ceil(1000).max(1);
            return Ok(RateLimitDecision::Limited { retry_after, reset_at });
        }

        self.store
            .append(&key, now_ms, Duration::from_secs(self.policy.window_secs))
            .await?;

        Ok(RateLimitDecision::Allowed {
            remaining: u64::from(self.policy.max_requests) - window.count - 1,
            reset_at,
        })
    }
}

/// Identifies the client: first `X-Forwarded-For` hop, else the peer address
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rate limiting middleware
///
/// # Errors
///
/// - 429 Too Many Requests: Rate limit exceeded
/// - 503 Service Unavailable: Rate limit store failure
pub async fn rate_limit_layer(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer);

    let decision = limiter.check(&client).await.map_err(|e| {
        tracing::error!(error = %e, scope = limiter.scope, "Rate limit check failed");
        ApiError::ServiceUnavailable("Rate limit service unavailable".to_string())
    })?;

    let limit = limiter.policy.max_requests;
    match decision {
        RateLimitDecision::Limited { retry_after, .. } => {
            tracing::warn!(client = %client, scope = limiter.scope, retry_after, "Rate limit exceeded");
            Err(ApiError::RateLimitExceeded {
                retry_after,
                message: format!("Rate limit exceeded. Try again in {} seconds", retry_after),
            })
        }
        RateLimitDecision::Allowed { remaining, reset_at } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at));
            Ok(response)
        }
    }
}
