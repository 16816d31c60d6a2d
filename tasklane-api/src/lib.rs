//! # Tasklane API Server Library
//!
//! HTTP surface of Tasklane: users register, own projects, share them with
//! members and track tasks with subtasks inside them.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with validation
//! - `middleware`: Rate limiting
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
