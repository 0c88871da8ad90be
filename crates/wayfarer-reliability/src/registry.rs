//! Per-key circuit breaker registry (spec.md §9 supplement): each target
//! (browser, proxy, upstream host) gets its own breaker instance, capped at
//! a fixed capacity with least-recently-used eviction so a long-running
//! process doesn't accumulate one breaker per ephemeral key forever.

use crate::circuit::CircuitBreakerImpl;
use crate::detection::DetectionStrategy;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use wayfarer_types::ports::circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry};

struct Entry {
    breaker: Arc<dyn CircuitBreaker>,
    last_touched: AtomicU64,
}

/// Builds a fresh [`DetectionStrategy`] per key so breakers don't share
/// mutable strategy state.
pub type DetectorFactory = Arc<dyn Fn() -> Box<dyn DetectionStrategy> + Send + Sync>;

pub struct LruCircuitBreakerRegistry {
    entries: DashMap<String, Entry>,
    capacity: usize,
    clock: AtomicU64,
    detector_factory: DetectorFactory,
    open_cooldown: Duration,
    rolling_window: Duration,
    half_open_success_threshold: u32,
}

impl LruCircuitBreakerRegistry {
    pub fn new(
        capacity: usize,
        open_cooldown: Duration,
        rolling_window: Duration,
        half_open_success_threshold: u32,
        detector_factory: DetectorFactory,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            clock: AtomicU64::new(0),
            detector_factory,
            open_cooldown,
            rolling_window,
            half_open_success_threshold,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_lru_if_full(&self) {
        if self.entries.len() < self.capacity {
            return;
        }
        let victim = self
            .entries
            .iter()
            .min_by_key(|e| e.value().last_touched.load(Ordering::Relaxed))
            .map(|e| e.key().clone());
        if let Some(key) = victim {
            self.entries.remove(&key);
            debug!(key = %key, "evicted least-recently-used circuit breaker");
        }
    }
}

#[async_trait]
impl CircuitBreakerRegistry for LruCircuitBreakerRegistry {
    async fn get_or_create(&self, key: &str) -> Arc<dyn CircuitBreaker> {
        if let Some(entry) = self.entries.get(key) {
            entry.last_touched.store(self.tick(), Ordering::Relaxed);
            return entry.breaker.clone();
        }

        self.evict_lru_if_full();

        let breaker: Arc<dyn CircuitBreaker> = Arc::new(CircuitBreakerImpl::new(
            key,
            (self.detector_factory)(),
            self.open_cooldown,
            self.rolling_window,
            self.half_open_success_threshold,
        ));
        let touched = self.tick();
        self.entries.insert(
            key.to_string(),
            Entry {
                breaker: breaker.clone(),
                last_touched: AtomicU64::new(touched),
            },
        );
        breaker
    }

    async fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn len(&self) -> usize {
        self.entries.len()
    }
}

impl LruCircuitBreakerRegistry {
    /// Names of breakers currently in the `Open` state, for a health snapshot.
    pub fn open_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.value().breaker.state() == wayfarer_types::ports::circuit_breaker::CircuitState::Open)
            .map(|e| e.key().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ConsecutiveFailures;

    fn registry(capacity: usize) -> LruCircuitBreakerRegistry {
        LruCircuitBreakerRegistry::new(
            capacity,
            Duration::from_secs(30),
            Duration::from_secs(60),
            2,
            Arc::new(|| Box::new(ConsecutiveFailures { threshold: 5 })),
        )
    }

    #[tokio::test]
    async fn reuses_breaker_for_same_key() {
        let r = registry(10);
        let a = r.get_or_create("proxy-1").await;
        let b = r.get_or_create("proxy-1").await;
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn evicts_least_recently_used_when_full() {
        let r = registry(2);
        r.get_or_create("a").await;
        r.get_or_create("b").await;
        r.get_or_create("a").await; // touch a, b is now LRU
        r.get_or_create("c").await; // evicts b
        assert_eq!(r.len().await, 2);
        assert!(r.entries.get("b").is_none());
        assert!(r.entries.get("a").is_some());
    }
}
