//! Selection engine: pick one eligible backend per round.

use std::sync::Arc;
use std::time::Instant;

use crate::balancer::pool::PriorityPool;
use crate::error::BalancerError;
use crate::handler::Handler;
use crate::health::HealthRegistry;

/// Outcome of a successful selection round.
pub(crate) struct Selected {
    pub name: String,
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Selected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selected").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Select exactly one eligible entry or report that none is available.
///
/// Runs as one atomic step under the balancer lock: candidates are
/// drained from the pool in ascending priority order into a provisional
/// list while being evaluated, then every one of them is reinserted,
/// restoring membership and size exactly regardless of outcome. The
/// pool strictly shrinks by one per iteration, so each entry is
/// evaluated at most once and the loop is bounded by pool size.
///
/// The admission gate is consulted before the health check, so a token
/// is consumed even for a candidate that turns out to be down. That
/// wastes capacity on unhealthy backends; it is kept as observed
/// behavior of the original balancer rather than silently corrected.
pub(crate) fn next_server(
    pool: &mut PriorityPool,
    health: &HealthRegistry,
    now: Instant,
) -> Result<Selected, BalancerError> {
    if pool.is_empty() || health.all_down() {
        return Err(BalancerError::NoAvailableServer);
    }

    let mut popped = Vec::with_capacity(pool.len());
    let mut selected = None;

    while let Some(mut entry) = pool.pop() {
        let allowed = entry.admit(now);
        tracing::debug!(backend = %entry.name(), priority = entry.priority(), allowed, "admission decision");

        if allowed && health.is_up(entry.name()) {
            selected = Some(Selected {
                name: entry.name().to_owned(),
                handler: entry.handler(),
            });
        } else {
            tracing::debug!(backend = %entry.name(), "candidate not eligible");
        }

        popped.push(entry);
        if selected.is_some() {
            break;
        }
    }

    for entry in popped {
        pool.push(entry);
    }

    match selected {
        Some(chosen) => {
            tracing::debug!(backend = %chosen.name, "backend selected");
            Ok(chosen)
        }
        None => Err(BalancerError::NoAvailableServer),
    }
}
