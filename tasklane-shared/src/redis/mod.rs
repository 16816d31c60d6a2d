/// Redis connectivity
///
/// - `client`: Connection manager wrapper with health checks

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
