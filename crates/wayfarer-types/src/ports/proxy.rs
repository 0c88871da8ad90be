//! Proxy-selection port (spec.md §4.2 / C1). Strategy implementations
//! (round-robin, least-used, best-health, random) live in `wayfarer-proxy`.

use crate::error::CoreResult;
use crate::model::ProxyInstance;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyRotationReason {
    Scheduled,
    OnError,
    HealthCheckFailed,
    Manual,
}

#[async_trait]
pub trait ProxySelector: Send + Sync {
    /// Pick a healthy proxy from the given pool; `None` means none available.
    fn select<'a>(&self, candidates: &'a [ProxyInstance]) -> Option<&'a ProxyInstance>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait ProxyManager: Send + Sync {
    async fn assign(&self, session_id: &str) -> CoreResult<ProxyInstance>;
    async fn rotate(&self, session_id: &str, reason: ProxyRotationReason) -> CoreResult<ProxyInstance>;
    async fn report_success(&self, proxy_id: &str, response_time_ms: f64);
    async fn report_error(&self, proxy_id: &str, error: &str);
    async fn health_check(&self, proxy_id: &str) -> CoreResult<bool>;
    async fn list(&self) -> Vec<ProxyInstance>;
}
