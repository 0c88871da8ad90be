//! Proxy manager (spec.md §4.2 / C1): assigns a proxy per session, rotates
//! on schedule/error/health-check-failure/manual request, and tracks health
//! and throughput metrics per proxy.

use crate::strategy::by_name;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use wayfarer_events::{Event, EventBus, EventSeverity};
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::model::ProxyInstance;
use wayfarer_types::ports::{ProxyManager, ProxyRotationReason, ProxySelector};

struct Assignment {
    proxy_id: String,
}

pub struct ProxyPoolManager {
    proxies: Mutex<HashMap<String, ProxyInstance>>,
    assignments: Mutex<HashMap<String, Assignment>>,
    selector: Box<dyn ProxySelector>,
    failover_threshold: u32,
    events: Option<EventBus>,
}

impl ProxyPoolManager {
    pub fn new(proxies: Vec<ProxyInstance>, strategy_name: &str, failover_threshold: u32, events: Option<EventBus>) -> Self {
        let map = proxies.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            proxies: Mutex::new(map),
            assignments: Mutex::new(HashMap::new()),
            selector: by_name(strategy_name),
            failover_threshold,
            events,
        }
    }

    fn emit(&self, event_type: &str, session_id: &str, payload: serde_json::Value) {
        if let Some(bus) = &self.events {
            bus.emit(Event::new(event_type, session_id, EventSeverity::Info, payload));
        }
    }

    async fn pick_healthy(&self) -> CoreResult<ProxyInstance> {
        let proxies = self.proxies.lock().await;
        let healthy: Vec<ProxyInstance> = proxies.values().filter(|p| p.health.healthy).cloned().collect();
        drop(proxies);

        self.selector
            .select(&healthy)
            .cloned()
            .ok_or_else(|| CoreError::resource_exhausted("no healthy proxies available"))
    }
}

#[async_trait]
impl ProxyManager for ProxyPoolManager {
    async fn assign(&self, session_id: &str) -> CoreResult<ProxyInstance> {
        let proxy = self.pick_healthy().await?;
        self.assignments.lock().await.insert(
            session_id.to_string(),
            Assignment { proxy_id: proxy.id.clone() },
        );
        self.emit("proxy.assigned", session_id, serde_json::json!({ "proxy_id": proxy.id }));
        Ok(proxy)
    }

    async fn rotate(&self, session_id: &str, reason: ProxyRotationReason) -> CoreResult<ProxyInstance> {
        let proxy = self.pick_healthy().await?;
        self.assignments.lock().await.insert(
            session_id.to_string(),
            Assignment { proxy_id: proxy.id.clone() },
        );
        info!(session_id, proxy_id = %proxy.id, reason = ?reason, "rotated proxy");
        self.emit(
            "proxy.rotated",
            session_id,
            serde_json::json!({ "proxy_id": proxy.id, "reason": format!("{reason:?}") }),
        );
        Ok(proxy)
    }

    async fn report_success(&self, proxy_id: &str, response_time_ms: f64) {
        let mut proxies = self.proxies.lock().await;
        if let Some(p) = proxies.get_mut(proxy_id) {
            p.metrics.request_count += 1;
            p.metrics.success_count += 1;
            p.metrics.last_used = Some(Utc::now());
            p.metrics.avg_response_time_ms = if p.metrics.request_count == 1 {
                response_time_ms
            } else {
                (p.metrics.avg_response_time_ms + response_time_ms) / 2.0
            };
            p.health.consecutive_failures = 0;
            p.health.healthy = true;
        }
    }

    async fn report_error(&self, proxy_id: &str, error: &str) {
        let should_mark_unhealthy = {
            let mut proxies = self.proxies.lock().await;
            match proxies.get_mut(proxy_id) {
                Some(p) => {
                    p.metrics.request_count += 1;
                    p.metrics.failure_count += 1;
                    p.health.consecutive_failures += 1;
                    p.health.last_error = Some(error.to_string());
                    p.health.last_checked = Utc::now();
                    let exceeded = p.health.consecutive_failures >= self.failover_threshold;
                    if exceeded {
                        p.health.healthy = false;
                    }
                    exceeded
                }
                None => false,
            }
        };

        if should_mark_unhealthy {
            warn!(proxy_id, error, "proxy marked unhealthy after repeated failures");
            self.emit(
                "proxy.unhealthy",
                "system",
                serde_json::json!({ "proxy_id": proxy_id, "error": error }),
            );
        }
    }

    async fn health_check(&self, proxy_id: &str) -> CoreResult<bool> {
        let proxies = self.proxies.lock().await;
        proxies
            .get(proxy_id)
            .map(|p| p.health.healthy)
            .ok_or_else(|| CoreError::not_found(format!("proxy {proxy_id} not found")))
    }

    async fn list(&self) -> Vec<ProxyInstance> {
        self.proxies.lock().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_types::model::{ProxyConfig, ProxyHealth, ProxyMetrics, ProxyProtocol};

    fn make_proxy(id: &str) -> ProxyInstance {
        ProxyInstance {
            id: id.to_string(),
            config: ProxyConfig {
                protocol: ProxyProtocol::Http,
                host: "h".into(),
                port: 80,
                username: None,
                password: None,
                bypass_list: vec![],
            },
            health: ProxyHealth::default(),
            metrics: ProxyMetrics::default(),
        }
    }

    #[tokio::test]
    async fn assign_picks_a_healthy_proxy() {
        let mgr = ProxyPoolManager::new(vec![make_proxy("p1")], "round_robin", 3, None);
        let p = mgr.assign("s1").await.unwrap();
        assert_eq!(p.id, "p1");
    }

    #[tokio::test]
    async fn repeated_errors_mark_proxy_unhealthy_and_exclude_from_assignment() {
        let mgr = ProxyPoolManager::new(vec![make_proxy("p1")], "round_robin", 2, None);
        mgr.report_error("p1", "connect timeout").await;
        mgr.report_error("p1", "connect timeout").await;
        assert!(!mgr.health_check("p1").await.unwrap());
        assert!(mgr.assign("s1").await.is_err());
    }

    #[tokio::test]
    async fn success_resets_consecutive_failure_count() {
        let mgr = ProxyPoolManager::new(vec![make_proxy("p1")], "round_robin", 3, None);
        mgr.report_error("p1", "e").await;
        mgr.report_success("p1", 120.0).await;
        let list = mgr.list().await;
        assert_eq!(list[0].health.consecutive_failures, 0);
    }
}
