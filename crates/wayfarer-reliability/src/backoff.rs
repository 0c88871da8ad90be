//! Retry backoff strategies, including jittered variants that need an RNG
//! (and so live here rather than as pure functions in `wayfarer-types`).

use std::time::Duration;
use wayfarer_types::ports::strategy::{BackoffStrategy, JitteredExponentialBackoff};

/// Full jitter: `uniform(0, exponential_ceiling(attempt))`. Spreads out
/// retries from many callers so they don't all wake up at once.
pub struct FullJitterBackoff {
    inner: JitteredExponentialBackoff,
}

impl FullJitterBackoff {
    pub fn new(base: Duration, factor: f64, max: Duration) -> Self {
        Self {
            inner: JitteredExponentialBackoff { base, factor, max },
        }
    }
}

impl BackoffStrategy for FullJitterBackoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let ceiling = self.inner.ceiling_for_attempt(attempt);
        let millis = (fastrand::f64() * ceiling.as_millis() as f64) as u64;
        Duration::from_millis(millis)
    }
    fn name(&self) -> &'static str {
        "full_jitter"
    }
}

/// Decorrelated jitter: `uniform(base, prev_delay * 3)`, clamped to `max`.
/// Tends to spread attempts out more than full jitter as attempts increase.
pub struct DecorrelatedJitterBackoff {
    base: Duration,
    max: Duration,
    prev: std::sync::Mutex<Duration>,
}

impl DecorrelatedJitterBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            prev: std::sync::Mutex::new(base),
        }
    }
}

impl BackoffStrategy for DecorrelatedJitterBackoff {
    fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        let mut prev = self.prev.lock().unwrap();
        let ceiling = (prev.as_millis() as u64 * 3).max(self.base.as_millis() as u64);
        let lo = self.base.as_millis() as u64;
        let hi = ceiling.max(lo + 1);
        let millis = lo + (fastrand::u64(..) % (hi - lo));
        let delay = Duration::from_millis(millis).min(self.max);
        *prev = delay;
        delay
    }
    fn name(&self) -> &'static str {
        "decorrelated_jitter"
    }
}

/// Fibonacci-sequence delays: 1, 1, 2, 3, 5, 8, ... × `unit`.
pub struct FibonacciBackoff {
    pub unit: Duration,
    pub max: Duration,
}

impl BackoffStrategy for FibonacciBackoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let (mut a, mut b) = (1u64, 1u64);
        for _ in 1..attempt.max(1) {
            let next = a + b;
            a = b;
            b = next;
        }
        Duration::from_millis(self.unit.as_millis() as u64 * a).min(self.max)
    }
    fn name(&self) -> &'static str {
        "fibonacci"
    }
}
