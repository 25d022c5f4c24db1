use std::future::Future;

use thiserror::Error;

/// Failure reported by the routing primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The transition was blocked before it started (e.g. by another guard).
    #[error("navigation blocked: {0}")]
    Blocked(String),

    /// The transition started but did not settle successfully.
    #[error("navigation failed: {0}")]
    Failed(String),
}

/// The routing primitive that performs the actual route transition.
///
/// This is an external collaborator; the navigator treats `navigate` as an
/// opaque suspension point that settles exactly once. Timeouts, if any, are
/// the primitive's responsibility.
pub trait RoutePrimitive: Send + Sync {
    fn navigate(&self, path: &str) -> impl Future<Output = Result<(), RouteError>> + Send;
}
