//! # Tasklane Shared Library
//!
//! Domain types, storage and business rules used by the Tasklane API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their `sqlx` queries
//! - `store`: Persistence gateway traits with PostgreSQL and in-memory backends
//! - `auth`: Tokens, password hashing, request identity and project authorization
//! - `services`: Entity services and the parent-task cascade
//! - `db`: Connection pool and migrations
//! - `redis`: Redis connection management

pub mod auth;
pub mod db;
pub mod models;
pub mod redis;
pub mod services;
pub mod store;

/// Current version of the Tasklane shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
