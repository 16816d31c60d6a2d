/// Authentication and authorization
///
/// # Modules
///
/// - `jwt`: HS256 access token creation and validation
/// - `password`: Argon2id password hashing
/// - `identity`: Bearer header parsing into an [`identity::AuthContext`]
/// - `authorization`: Project ownership/membership checks that cascade to
///   tasks and subtasks

pub mod authorization;
pub mod identity;
pub mod jwt;
pub mod password;
