//! Small pluggable-strategy traits shared across crates (spec.md §9's
//! "data-driven registries" supplement): backoff for retries, recycling
//! scoring for the pool, detection strategy for the circuit breaker.

use std::time::Duration;

/// Computes the delay before attempt N (1-indexed) of a retried operation.
pub trait BackoffStrategy: Send + Sync {
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedBackoff(pub Duration);

impl BackoffStrategy for FixedBackoff {
    fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.0
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub factor: f64,
    pub max: Duration,
}

impl BackoffStrategy for ExponentialBackoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.base.as_millis() as f64 * self.factor.powi(attempt.saturating_sub(1) as i32);
        Duration::from_millis(millis.min(self.max.as_millis() as f64) as u64)
    }
    fn name(&self) -> &'static str {
        "exponential"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    pub base: Duration,
    pub increment: Duration,
    pub max: Duration,
}

impl BackoffStrategy for LinearBackoff {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let millis = self.base.as_millis() as u64
            + self.increment.as_millis() as u64 * attempt.saturating_sub(1) as u64;
        Duration::from_millis(millis.min(self.max.as_millis() as u64))
    }
    fn name(&self) -> &'static str {
        "linear"
    }
}

/// Exponential backoff with full jitter: `uniform(0, computed_delay)`.
/// Kept as a marker type; the actual jitter draw lives in
/// `wayfarer-reliability` since it needs an RNG, not a pure function.
#[derive(Debug, Clone, Copy)]
pub struct JitteredExponentialBackoff {
    pub base: Duration,
    pub factor: f64,
    pub max: Duration,
}

impl JitteredExponentialBackoff {
    pub fn ceiling_for_attempt(&self, attempt: u32) -> Duration {
        ExponentialBackoff {
            base: self.base,
            factor: self.factor,
            max: self.max,
        }
        .delay_for_attempt(attempt)
    }
}

/// Scores a pooled browser for recycling priority; higher score recycles
/// first. Pluggable so the pool's eviction policy isn't hardcoded.
pub trait RecyclingScorer: Send + Sync {
    fn score(&self, page_count: u32, use_count: u64, idle: Duration, age: Duration, health_score: f64) -> f64;
}
