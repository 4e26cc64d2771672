//! Balancer facade.
//!
//! # Data Flow
//! ```text
//! dispatch(request)
//!     → fast-path check (empty pool / every backend down → 503)
//!     → select::next_server (pool order + health + admission gate,
//!       under the balancer lock)
//!     → lock released, request forwarded to the chosen handler
//!
//! set_status(name, up)
//!     → health registry (aggregate flip → updaters, typically the
//!       parent balancer's set_status)
//! ```
//!
//! # Design Decisions
//! - One exclusive lock per balancer instance guards the pool, the
//!   healthy set, and the updater list; nothing awaits while holding it
//! - The chosen handler is awaited after the lock is released, so a
//!   nested balancer's lock is never taken under its parent's
//! - A balancer implements `Handler`, so it can be registered as a
//!   backend of another balancer

mod bucket;
mod entry;
mod pool;
mod select;

pub use entry::BackendLimits;

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::BalancerError;
use crate::handler::Handler;
use crate::health::HealthRegistry;
use entry::BackendEntry;
use pool::PriorityPool;

/// Sticky-session cookie descriptor.
///
/// Stored at construction for a future session-affinity path; the
/// current selection path does not consult it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickyCookie {
    pub name: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

struct Inner {
    pool: PriorityPool,
    health: HealthRegistry,
}

/// A priority-ordered, token-bucket load balancer.
///
/// Backends are tried in ascending priority order; each carries a
/// token bucket capping instantaneous admission, and a health status
/// fed by an external checker through [`Balancer::set_status`].
pub struct Balancer<C: Clock = SystemClock> {
    inner: Mutex<Inner>,
    clock: C,
    sticky: Option<StickyCookie>,
}

impl Balancer<SystemClock> {
    /// Create a balancer. `wants_health_check` gates
    /// [`Balancer::register_status_updater`]: leave it disabled for
    /// leaf balancers no parent observes.
    pub fn new(sticky: Option<StickyCookie>, wants_health_check: bool) -> Self {
        Self::with_clock(sticky, wants_health_check, SystemClock)
    }
}

impl<C: Clock> Balancer<C> {
    /// Create a balancer with an explicit time source.
    pub fn with_clock(sticky: Option<StickyCookie>, wants_health_check: bool, clock: C) -> Self {
        Self {
            inner: Mutex::new(Inner {
                pool: PriorityPool::new(),
                health: HealthRegistry::new(wants_health_check),
            }),
            clock,
            sticky,
        }
    }

    /// Register a backend. Parameters are sanitized per
    /// [`BackendLimits`]; a backend whose average is zero or negative
    /// is silently ignored. The entry is inserted into the pool and
    /// marked up atomically.
    pub fn add(&self, name: &str, handler: Arc<dyn Handler>, limits: BackendLimits) {
        let now = self.clock.now();
        let Some(entry) = BackendEntry::new(name, handler, limits, now) else {
            tracing::debug!(backend = name, "non-positive average, backend not registered");
            return;
        };

        let mut inner = self.inner.lock().expect("balancer mutex poisoned");
        inner.health.insert(entry.name());
        inner.pool.push(entry);
    }

    /// Record that the named backend is now up or down. When the
    /// balancer's aggregate health flips, registered updaters run
    /// synchronously before this returns.
    pub fn set_status(&self, name: &str, up: bool) {
        let mut inner = self.inner.lock().expect("balancer mutex poisoned");
        inner.health.mark(name, up);
    }

    /// Add a hook observing this balancer's aggregate-health flips,
    /// typically wired by a parent balancer to its own `set_status`.
    ///
    /// Fails with [`BalancerError::HealthCheckDisabled`] when the
    /// balancer was constructed without health-check propagation.
    pub fn register_status_updater(
        &self,
        updater: impl Fn(bool) + Send + Sync + 'static,
    ) -> Result<(), BalancerError> {
        let mut inner = self.inner.lock().expect("balancer mutex poisoned");
        inner.health.register_updater(Box::new(updater))
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("balancer mutex poisoned").pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The stored sticky-session descriptor, if any.
    pub fn sticky(&self) -> Option<&StickyCookie> {
        self.sticky.as_ref()
    }

    /// Select a backend and forward the request to it.
    ///
    /// Responds 503 with a short textual body when no backend is
    /// eligible; otherwise delegates entirely to the chosen handler,
    /// which may itself be a nested balancer.
    pub async fn dispatch(&self, req: Request<Body>) -> Response<Body> {
        let chosen = {
            let mut inner = self.inner.lock().expect("balancer mutex poisoned");
            if inner.pool.is_empty() || inner.health.all_down() {
                return service_unavailable();
            }
            let Inner { pool, health } = &mut *inner;
            match select::next_server(pool, health, self.clock.now()) {
                Ok(chosen) => chosen,
                Err(BalancerError::NoAvailableServer) => return service_unavailable(),
                Err(err) => {
                    return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
                }
            }
        };

        tracing::debug!(backend = %chosen.name, "forwarding request");
        chosen.handler.call(req).await
    }
}

impl<C: Clock> Handler for Balancer<C> {
    fn call(&self, req: Request<Body>) -> BoxFuture<'_, Response<Body>> {
        Box::pin(self.dispatch(req))
    }
}

fn service_unavailable() -> Response<Body> {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        BalancerError::NoAvailableServer.to_string(),
    )
        .into_response()
}
