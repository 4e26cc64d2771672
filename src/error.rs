//! Balancer error types.

use thiserror::Error;

/// Errors surfaced by a balancer.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// Returned by `register_status_updater` when the balancer was
    /// constructed without health-check propagation enabled.
    #[error("health check not enabled for this service")]
    HealthCheckDisabled,

    /// The pool is empty, every backend is down, or every candidate was
    /// rate-limited during a full scan.
    #[error("no available server")]
    NoAvailableServer,

    /// Reserved. Not reachable through documented call paths.
    #[error("internal balancer error: {0}")]
    Internal(String),
}
