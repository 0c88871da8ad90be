//! Structured metrics snapshot (spec.md §6, `health()`), grounded on
//! `BrowserPool::stats()` and the circuit breaker registry's open-key list.

use crate::plane::ControlPlane;
use serde::{Deserialize, Serialize};
use wayfarer_types::ports::SessionBackend;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub pool_size: usize,
    pub in_use: usize,
    pub healthy_count: usize,
    pub open_breakers: Vec<String>,
    pub backend_latency_ms: f64,
}

impl ControlPlane {
    pub async fn health(&self) -> HealthSnapshot {
        let stats = self.pool.stats().await;

        // The store has no dedicated ping; a cheap read doubles as both a
        // reachability probe and the maintenance sweep's off-cycle trigger.
        let probe_start = std::time::Instant::now();
        let _ = self.store.evict_expired().await;
        let backend_latency_ms = probe_start.elapsed().as_secs_f64() * 1000.0;

        HealthSnapshot {
            pool_size: stats.capacity,
            in_use: stats.in_use,
            healthy_count: stats.available,
            open_breakers: self.breakers.open_keys(),
            backend_latency_ms,
        }
    }
}
