//! Health registry: which backends of a balancer are currently up,
//! and who to tell when the aggregate answer changes.
//!
//! # Design Decisions
//! - Aggregate health is "at least one backend up" (set non-empty)
//! - Updaters run synchronously, in registration order, only on an
//!   aggregate flip
//! - An updater typically calls `set_status` on a parent balancer,
//!   cascading health through a composition tree; trees are acyclic
//!   by construction, so taking the parent's lock from inside the
//!   child's critical section cannot deadlock

use std::collections::HashSet;

use crate::error::BalancerError;

/// Callback invoked with the new aggregate status when it flips.
pub type StatusUpdater = Box<dyn Fn(bool) + Send + Sync>;

/// Set of currently-up backend names plus the propagation hooks.
pub(crate) struct HealthRegistry {
    /// Whether updaters may be registered. Fixed at construction;
    /// guards leaf balancers no parent observes from carrying a
    /// callback list that would silently do nothing.
    propagate: bool,
    up: HashSet<String>,
    updaters: Vec<StatusUpdater>,
}

impl HealthRegistry {
    pub(crate) fn new(propagate: bool) -> Self {
        Self {
            propagate,
            up: HashSet::new(),
            updaters: Vec::new(),
        }
    }

    pub(crate) fn is_up(&self, name: &str) -> bool {
        self.up.contains(name)
    }

    /// True when no backend is up; an empty set means the whole
    /// balancer is down.
    pub(crate) fn all_down(&self) -> bool {
        self.up.is_empty()
    }

    /// Mark a freshly added backend as up without running updaters.
    pub(crate) fn insert(&mut self, name: &str) {
        self.up.insert(name.to_owned());
    }

    /// Record the status of one backend. When the aggregate answer
    /// flips, every registered updater is invoked synchronously with
    /// the new aggregate, in registration order.
    pub(crate) fn mark(&mut self, name: &str, up: bool) {
        let up_before = !self.up.is_empty();

        tracing::debug!(backend = name, up, "setting backend status");

        if up {
            self.up.insert(name.to_owned());
        } else {
            self.up.remove(name);
        }

        let up_after = !self.up.is_empty();
        if up_before == up_after {
            tracing::debug!(up = up_after, "aggregate status unchanged, not propagating");
            return;
        }

        tracing::debug!(up = up_after, "propagating aggregate status change");
        for updater in &self.updaters {
            updater(up_after);
        }
    }

    pub(crate) fn register_updater(
        &mut self,
        updater: StatusUpdater,
    ) -> Result<(), BalancerError> {
        if !self.propagate {
            return Err(BalancerError::HealthCheckDisabled);
        }
        self.updaters.push(updater);
        Ok(())
    }
}
