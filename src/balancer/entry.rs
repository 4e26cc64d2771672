//! Backend entry: one upstream target with its rate and priority
//! parameters.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::balancer::bucket::TokenBucket;
use crate::handler::Handler;

/// Raw admission parameters accepted by `Balancer::add`.
///
/// All fields are optional so a configuration layer can omit them;
/// missing or out-of-range values are sanitized at registration time.
/// `period` is expressed in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BackendLimits {
    /// Bucket capacity. Values below 1 are clamped to 1.
    pub burst: Option<i64>,
    /// Tokens produced per period. A value of 0 or less means the
    /// backend is not registered at all.
    pub average: Option<i64>,
    /// Refill period in milliseconds. Values below 1 are clamped to 1.
    pub period: Option<i64>,
    /// Poll order within a selection round; lower values are tried
    /// first. Values below 1 are clamped to 1.
    pub priority: Option<i64>,
}

/// A registered backend: static parameters plus token-bucket state.
///
/// Created exactly once by `Balancer::add` and never removed from the
/// pool; the bucket is mutated only through admission checks.
pub(crate) struct BackendEntry {
    name: String,
    handler: Arc<dyn Handler>,
    burst: u64,
    average: u64,
    period: Duration,
    priority: i64,
    bucket: TokenBucket,
    /// Last admission decision. Diagnostic only, not load-bearing.
    last_allowed: bool,
}

impl BackendEntry {
    /// Build an entry from raw limits, applying the sanitization rules.
    /// Returns `None` when the average is not positive: such a backend
    /// would never admit a request and is silently dropped.
    pub(crate) fn new(
        name: impl Into<String>,
        handler: Arc<dyn Handler>,
        limits: BackendLimits,
        now: Instant,
    ) -> Option<Self> {
        let burst = limits.burst.unwrap_or(1).max(1) as u64;

        let average = limits.average.unwrap_or(1);
        if average <= 0 {
            return None;
        }
        let average = average as u64;

        let period_ms = limits.period.unwrap_or(1).max(1) as u64;
        let period = Duration::from_millis(period_ms);

        let priority = limits.priority.unwrap_or(1).max(1);

        // One token per period / average.
        let interval = Duration::from_nanos((period.as_nanos() / u128::from(average)).max(1) as u64);

        Some(Self {
            name: name.into(),
            handler,
            burst,
            average,
            period,
            priority,
            bucket: TokenBucket::new(burst, interval, now),
            last_allowed: true,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    pub(crate) fn priority(&self) -> i64 {
        self.priority
    }

    /// Run the admission gate, caching the decision on the entry.
    pub(crate) fn admit(&mut self, now: Instant) -> bool {
        self.last_allowed = self.bucket.allow(now);
        self.last_allowed
    }
}

impl fmt::Debug for BackendEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendEntry")
            .field("name", &self.name)
            .field("burst", &self.burst)
            .field("average", &self.average)
            .field("period", &self.period)
            .field("priority", &self.priority)
            .field("last_allowed", &self.last_allowed)
            .finish_non_exhaustive()
    }
}

// Ordering is by priority alone; `BinaryHeap` is a max-heap, so the
// comparison is reversed to make pop() yield the lowest priority value.
impl Ord for BackendEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.cmp(&self.priority)
    }
}

impl PartialOrd for BackendEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BackendEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for BackendEntry {}
