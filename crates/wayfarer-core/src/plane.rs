//! Wires the pool, store, proxy, reliability and action crates into a
//! single facade the Control API is built on (spec.md §6).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use wayfarer_actions::{default_chain, ActionExecutor, RetryPolicy, ValidatorChain};
use wayfarer_audit::{CompositeAuditSink, TracingAuditSink};
use wayfarer_config::WayfarerConfig;
use wayfarer_events::{BusAuditSink, EventBus};
use wayfarer_pool::{BrowserCheckout, BrowserPool, BrowserPoolConfig, PageManager};
use wayfarer_reliability::registry::LruCircuitBreakerRegistry;
use wayfarer_reliability::{FullJitterBackoff, ThresholdWindow};
use wayfarer_store::{MemoryHandleTable, MemorySessionBackend};
use wayfarer_types::error::CoreResult;
use wayfarer_types::model::ProxyInstance;
use wayfarer_types::ports::strategy::BackoffStrategy;
use wayfarer_types::ports::{AuditSink, BrowserEngineFactory, HandleTable, ProxyManager, SessionBackend};

/// Tracks the single browser checkout backing a context and the pages
/// opened on it, so closing the last page checks the browser back in.
pub(crate) struct ContextLease {
    pub checkout: BrowserCheckout,
    pub page_ids: Vec<String>,
    pub proxy_id: Option<String>,
}

pub struct ControlPlane {
    pub(crate) store: Arc<dyn SessionBackend>,
    pub(crate) handles: Arc<dyn HandleTable>,
    pub(crate) pool: Arc<BrowserPool>,
    pub(crate) page_manager: Arc<PageManager>,
    pub(crate) proxy: Arc<dyn ProxyManager>,
    pub(crate) breakers: Arc<LruCircuitBreakerRegistry>,
    pub(crate) chain: Arc<ValidatorChain>,
    pub(crate) executor: Arc<ActionExecutor>,
    pub(crate) retry: Arc<RetryPolicy>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) events: EventBus,
    pub(crate) leases: RwLock<HashMap<String, ContextLease>>,
    pub(crate) session_ttl: chrono::Duration,
}

impl ControlPlane {
    pub async fn new(
        config: WayfarerConfig,
        factory: Arc<dyn BrowserEngineFactory>,
        proxies: Vec<ProxyInstance>,
    ) -> CoreResult<Self> {
        let events = EventBus::new();

        let pool_config = BrowserPoolConfig {
            min_pool_size: config.pool.min_size as usize,
            max_pool_size: config.pool.max_size as usize,
            initial_pool_size: config.pool.min_size as usize,
            max_pages_per_browser: config.pool.max_pages_per_browser,
            acquire_timeout: config.pool.acquire_timeout,
            idle_timeout: config.pool.idle_timeout,
            max_lifetime: config.pool.max_lifetime,
            fast_check_interval: Duration::from_secs(2),
            full_check_interval: config.pool.health_check_interval,
            soft_memory_limit_mb: config.pool.soft_memory_limit_mb,
            hard_memory_limit_mb: config.pool.hard_memory_limit_mb,
            cleanup_timeout: Duration::from_secs(5),
        };
        let pool = Arc::new(BrowserPool::new(pool_config, factory, Some(events.clone())).await?);

        let page_manager = Arc::new(PageManager::new(config.pool.max_pages_per_browser));

        let proxy = Arc::new(wayfarer_proxy::ProxyPoolManager::new(
            proxies,
            &config.proxy.strategy,
            config.proxy.failover_threshold,
            Some(events.clone()),
        ));

        let breakers = Arc::new(LruCircuitBreakerRegistry::new(
            config.circuit_breaker.registry_capacity,
            config.circuit_breaker.open_cooldown,
            config.circuit_breaker.rolling_window,
            config.circuit_breaker.success_threshold,
            Arc::new({
                let failure_threshold = config.circuit_breaker.failure_threshold;
                let minimum_throughput = config.circuit_breaker.minimum_throughput;
                move || {
                    Box::new(ThresholdWindow { failure_threshold, minimum_throughput })
                        as Box<dyn wayfarer_reliability::DetectionStrategy>
                }
            }),
        ));

        let store: Arc<dyn SessionBackend> = Arc::new(MemorySessionBackend::new());
        let handles: Arc<dyn HandleTable> = Arc::new(MemoryHandleTable::new());

        // `file://` navigation stays blocked regardless of the upload/download
        // toggle, which governs a different action family entirely.
        let chain = Arc::new(default_chain(vec![], false));
        let sandbox_root = config
            .validator
            .allowed_download_dirs
            .first()
            .cloned()
            .unwrap_or_else(|| "/tmp/wayfarer-downloads".to_string());
        let executor = Arc::new(ActionExecutor::new(handles.clone(), sandbox_root.into()));

        let audit: Arc<dyn AuditSink> = Arc::new(CompositeAuditSink::new(vec![
            Arc::new(TracingAuditSink),
            Arc::new(BusAuditSink::new(events.clone())),
        ]));

        let backoff: Arc<dyn BackoffStrategy> = Arc::new(FullJitterBackoff::new(
            config.retry.base_delay,
            config.retry.backoff_factor,
            config.retry.max_delay,
        ));
        let retry = Arc::new(RetryPolicy::new(config.retry.max_attempts, backoff, audit.clone()));

        Ok(Self {
            store,
            handles,
            pool,
            page_manager,
            proxy,
            breakers,
            chain,
            executor,
            retry,
            audit,
            events,
            leases: RwLock::new(HashMap::new()),
            session_ttl: chrono::Duration::from_std(config.session.default_ttl)
                .unwrap_or_else(|_| chrono::Duration::seconds(1800)),
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn shutdown(self) -> CoreResult<()> {
        let mut leases = self.leases.write().await;
        for (_, lease) in leases.drain() {
            let _ = lease.checkout.checkin().await;
        }
        drop(leases);
        Arc::try_unwrap(self.pool)
            .map_err(|_| wayfarer_types::error::CoreError::internal("pool still has outstanding references"))?
            .shutdown()
            .await
    }
}
