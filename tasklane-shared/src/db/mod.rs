/// Database layer for Tasklane
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: Embedded schema migrations
///
/// Queries live with their models in [`crate::models`].

pub mod migrations;
pub mod pool;
