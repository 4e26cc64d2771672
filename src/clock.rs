//! Time source abstraction.
//!
//! Admission decisions depend on elapsed wall-clock time. Keeping the
//! time source behind a trait lets tests drive the token buckets with
//! a deterministic clock instead of sleeping.

use std::time::Instant;

/// A monotonic time source.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// The default clock, backed by `Instant::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
