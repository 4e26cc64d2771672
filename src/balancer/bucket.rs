//! Per-backend token bucket admission gate.

use std::time::{Duration, Instant};

/// A token bucket refilled lazily from elapsed time.
///
/// Capacity is the backend's sanitized burst; one token is produced
/// every `interval` (= period / average). Buckets start full. There is
/// no give-back: a consumed token stays consumed even if the entry is
/// ultimately not the one selected for the request.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    capacity: u64,
    tokens: u64,
    interval: Duration,
    /// Accounting point: all time up to this instant has been credited.
    last_refill: Instant,
}

impl TokenBucket {
    pub(crate) fn new(capacity: u64, interval: Duration, now: Instant) -> Self {
        Self {
            capacity: capacity.max(1),
            tokens: capacity.max(1),
            interval: interval.max(Duration::from_nanos(1)),
            last_refill: now,
        }
    }

    /// Consume one token if available. Returns whether admission was
    /// granted. Never blocks; refill is a constant-time computation
    /// over elapsed time.
    pub(crate) fn allow(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Credit whole refill intervals elapsed since the accounting point.
    ///
    /// A replenished token becomes spendable only once its full interval
    /// has strictly elapsed: at exactly `k * interval` after depletion,
    /// only `k - 1` tokens have been earned. While the bucket is full the
    /// accounting point tracks `now`, so idle time is never banked beyond
    /// capacity.
    fn refill(&mut self, now: Instant) {
        if self.tokens == self.capacity {
            self.last_refill = now;
            return;
        }

        let interval = self.interval.as_nanos().max(1);
        let elapsed = now.saturating_duration_since(self.last_refill).as_nanos();
        let earned = if elapsed == 0 { 0 } else { (elapsed - 1) / interval };
        if earned == 0 {
            return;
        }

        let deficit = u128::from(self.capacity - self.tokens);
        if earned >= deficit {
            self.tokens = self.capacity;
            self.last_refill = now;
        } else {
            self.tokens += earned as u64;
            self.last_refill += Duration::from_nanos((earned * interval) as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(capacity: u64, interval_ms: u64) -> (TokenBucket, Instant) {
        let start = Instant::now();
        (
            TokenBucket::new(capacity, Duration::from_millis(interval_ms), start),
            start,
        )
    }

    #[test]
    fn starts_full() {
        let (mut b, start) = bucket(2, 100);
        assert!(b.allow(start));
        assert!(b.allow(start));
        assert!(!b.allow(start));
    }

    #[test]
    fn refill_boundary_is_strict() {
        let (mut b, start) = bucket(1, 100);
        assert!(b.allow(start));

        // Exactly one interval later the token is not yet spendable.
        assert!(!b.allow(start + Duration::from_millis(100)));
        // Strictly past the interval it is.
        assert!(b.allow(start + Duration::from_millis(100) + Duration::from_nanos(1)));
    }

    #[test]
    fn partial_progress_is_preserved_across_checks() {
        let (mut b, start) = bucket(1, 100);
        assert!(b.allow(start));

        // Repeated denied checks must not reset accrued refill time.
        assert!(!b.allow(start + Duration::from_millis(40)));
        assert!(!b.allow(start + Duration::from_millis(80)));
        assert!(b.allow(start + Duration::from_millis(101)));
    }

    #[test]
    fn idle_time_does_not_bank_beyond_capacity() {
        let (mut b, start) = bucket(2, 100);
        // Long idle while full: still only two tokens available.
        let later = start + Duration::from_secs(3600);
        assert!(b.allow(later));
        assert!(b.allow(later));
        assert!(!b.allow(later));
    }

    #[test]
    fn refills_multiple_tokens_at_once() {
        let (mut b, start) = bucket(3, 100);
        for _ in 0..3 {
            assert!(b.allow(start));
        }
        let later = start + Duration::from_millis(250);
        assert!(b.allow(later));
        assert!(b.allow(later));
        assert!(!b.allow(later));
    }
}
