/// HTTP middleware
///
/// - `rate_limit`: Sliding-window request limits per client

pub mod rate_limit;
