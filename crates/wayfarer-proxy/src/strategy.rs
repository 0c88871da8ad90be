//! Proxy selection strategies (spec.md §4.2). All pick from the subset of
//! `candidates` that's currently marked healthy; callers hand in that
//! pre-filtered slice.

use wayfarer_types::model::ProxyInstance;
use wayfarer_types::ports::ProxySelector;

pub struct RoundRobin {
    next: std::sync::atomic::AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self { next: std::sync::atomic::AtomicUsize::new(0) }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxySelector for RoundRobin {
    fn select<'a>(&self, candidates: &'a [ProxyInstance]) -> Option<&'a ProxyInstance> {
        if candidates.is_empty() {
            return None;
        }
        let i = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed) % candidates.len();
        candidates.get(i)
    }
    fn name(&self) -> &'static str {
        "round_robin"
    }
}

pub struct LeastUsed;

impl ProxySelector for LeastUsed {
    fn select<'a>(&self, candidates: &'a [ProxyInstance]) -> Option<&'a ProxyInstance> {
        candidates.iter().min_by_key(|p| p.metrics.request_count)
    }
    fn name(&self) -> &'static str {
        "least_used"
    }
}

/// `0.7 * success_rate + 0.3 * (1 - min(1, avg_latency_ms / 10_000))`
pub struct BestHealth;

impl BestHealth {
    pub fn score(proxy: &ProxyInstance) -> f64 {
        let success_rate = proxy.metrics.success_rate();
        let latency_penalty = (proxy.metrics.avg_response_time_ms / 10_000.0).min(1.0);
        0.7 * success_rate + 0.3 * (1.0 - latency_penalty)
    }
}

impl ProxySelector for BestHealth {
    fn select<'a>(&self, candidates: &'a [ProxyInstance]) -> Option<&'a ProxyInstance> {
        candidates
            .iter()
            .max_by(|a, b| Self::score(a).partial_cmp(&Self::score(b)).unwrap())
    }
    fn name(&self) -> &'static str {
        "best_health"
    }
}

pub struct Random;

impl ProxySelector for Random {
    fn select<'a>(&self, candidates: &'a [ProxyInstance]) -> Option<&'a ProxyInstance> {
        if candidates.is_empty() {
            return None;
        }
        candidates.get(fastrand::usize(..candidates.len()))
    }
    fn name(&self) -> &'static str {
        "random"
    }
}

pub fn by_name(name: &str) -> Box<dyn ProxySelector> {
    match name {
        "round_robin" => Box::new(RoundRobin::new()),
        "least_used" => Box::new(LeastUsed),
        "random" => Box::new(Random),
        _ => Box::new(BestHealth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_types::model::{ProxyConfig, ProxyHealth, ProxyMetrics, ProxyProtocol};

    fn proxy(id: &str, success_rate_samples: (u64, u64), avg_latency_ms: f64) -> ProxyInstance {
        ProxyInstance {
            id: id.to_string(),
            config: ProxyConfig {
                protocol: ProxyProtocol::Http,
                host: "h".into(),
                port: 1,
                username: None,
                password: None,
                bypass_list: vec![],
            },
            health: ProxyHealth::default(),
            metrics: ProxyMetrics {
                request_count: success_rate_samples.0,
                success_count: success_rate_samples.1,
                failure_count: success_rate_samples.0 - success_rate_samples.1,
                avg_response_time_ms: avg_latency_ms,
                last_used: None,
            },
        }
    }

    #[test]
    fn best_health_prefers_higher_success_lower_latency() {
        let fast_reliable = proxy("a", (100, 100), 100.0);
        let slow_flaky = proxy("b", (100, 50), 9000.0);
        let candidates = vec![slow_flaky, fast_reliable];
        let chosen = BestHealth.select(&candidates).unwrap();
        assert_eq!(chosen.id, "a");
    }

    #[test]
    fn round_robin_cycles_through_all_candidates() {
        let rr = RoundRobin::new();
        let candidates = vec![proxy("a", (1, 1), 0.0), proxy("b", (1, 1), 0.0)];
        let first = rr.select(&candidates).unwrap().id.clone();
        let second = rr.select(&candidates).unwrap().id.clone();
        assert_ne!(first, second);
    }

    #[test]
    fn least_used_picks_lowest_request_count() {
        let candidates = vec![proxy("busy", (500, 500), 0.0), proxy("idle", (1, 1), 0.0)];
        assert_eq!(LeastUsed.select(&candidates).unwrap().id, "idle");
    }
}
