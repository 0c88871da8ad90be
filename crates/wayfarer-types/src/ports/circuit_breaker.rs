//! Circuit-breaker port (spec.md §4.3 / C3). The state machine
//! implementation lives in `wayfarer-reliability`; this trait is the seam
//! the action executor and the proxy manager call through.

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitStats {
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub consecutive_failures: u32,
    pub opened_count: u64,
}

#[async_trait]
pub trait CircuitBreaker: Send + Sync {
    fn state(&self) -> CircuitState;
    fn stats(&self) -> CircuitStats;

    /// Whether a call may proceed right now. `Open` without an elapsed
    /// cooldown returns `false`; an elapsed cooldown transitions to
    /// `HalfOpen` as a side effect and returns `true`.
    async fn allow_call(&self) -> bool;
    async fn on_success(&self);
    async fn on_failure(&self);
    async fn reset(&self);
}

/// Per-key registry so each (browser, proxy, upstream) target gets its own
/// breaker instance instead of one global switch.
#[async_trait]
pub trait CircuitBreakerRegistry: Send + Sync {
    async fn get_or_create(&self, key: &str) -> std::sync::Arc<dyn CircuitBreaker>;
    async fn remove(&self, key: &str);
    async fn len(&self) -> usize;
}
