//! Common test utilities for integration tests
//!
//! The router runs over [`MemoryStore`] and [`MemoryRateLimitStore`], so these
//! tests need neither PostgreSQL nor Redis.
//!
//! - Test configuration
//! - User registration and login helpers
//! - Request and JSON body helpers

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use std::sync::Arc;
use tasklane_api::app::{build_router, AppState};
use tasklane_api::config::{
    ApiConfig, Config, DatabaseConfig, JwtConfig, RateLimitConfig, RateLimitPolicy, RedisSettings,
};
use tasklane_api::middleware::rate_limit::MemoryRateLimitStore;
use tasklane_shared::store::memory::MemoryStore;
use tower::Service as _;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test context containing the router and its configuration
pub struct TestContext {
    pub app: axum::Router,
    pub config: Config,
}

/// A registered user with a live token
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            production: false,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 10,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
            run_migrations: false,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-at-least-32-bytes".to_string(),
            expire_hours: 1,
        },
        redis: RedisSettings {
            url: "redis://localhost:6379".to_string(),
        },
        rate_limit: RateLimitConfig {
            auth: RateLimitPolicy {
                max_requests: 1000,
                window_secs: 60,
            },
            api: RateLimitPolicy {
                max_requests: 10_000,
                window_secs: 180,
            },
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryRateLimitStore::new()),
            config.clone(),
        );

        TestContext {
            app: build_router(state),
            config,
        }
    }

    /// Sends a request; `token` is sent as a bearer token when present
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.7");

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.app.clone().call(builder.body(body).unwrap()).await.unwrap()
    }

    /// Sends a request and decodes the JSON response
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, token, body).await;
        let status = response.status();
        (status, read_json(response).await)
    }

    /// Registers a user and returns its id and token
    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .json(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a project and returns its id
    pub async fn create_project(&self, owner: &TestUser, name: &str) -> i64 {
        let (status, body) = self
            .json(
                Method::POST,
                "/v1/projects",
                Some(&owner.token),
                Some(json!({ "name": name, "description": "integration" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, user: &TestUser, project_id: i64, title: &str) -> i64 {
        let (status, body) = self
            .json(
                Method::POST,
                &format!("/v1/projects/{}/tasks", project_id),
                Some(&user.token),
                Some(json!({ "title": title })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}
