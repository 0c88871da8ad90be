//! Browser pool (spec.md §4.1 / C2): checkout/checkin lease management over
//! a bounded set of browser processes, with a background maintenance loop
//! doing tiered health checks, expiry sweeps and pool-size upkeep.

use crate::browser::{BrowserHealth, PooledBrowser};
use crate::config::BrowserPoolConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock, Semaphore};
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use wayfarer_events::{Event, EventBus, EventSeverity};
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::ports::{BrowserEngineFactory, BrowserPage};

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    pub available: usize,
    pub in_use: usize,
    pub capacity: usize,
}

/// Cloneable handle to the pool's shared state, held by a [`BrowserCheckout`]
/// so checkin doesn't need to hold a strong reference to the whole pool.
#[derive(Clone)]
struct PoolHandle {
    available: Arc<Mutex<VecDeque<PooledBrowser>>>,
    in_use: Arc<RwLock<HashMap<String, PooledBrowser>>>,
    config: BrowserPoolConfig,
    events: Option<EventBus>,
}

impl PoolHandle {
    async fn checkin(&self, browser_id: &str) -> CoreResult<()> {
        let browser = {
            let mut in_use = self.in_use.write().await;
            in_use.remove(browser_id)
        };

        let Some(mut browser) = browser else {
            warn!(browser_id, "attempted to check in unknown browser");
            return Ok(());
        };

        browser.mark_checked_in();
        let health = browser.full_health_check(self.config.max_pages_per_browser).await;

        match health {
            BrowserHealth::Healthy => {
                self.available.lock().await.push_back(browser);
                self.emit("pool.checked_in", browser_id);
                debug!(browser_id, "browser checked in");
            }
            _ => {
                browser.cleanup().await;
                self.emit("pool.removed", browser_id);
                warn!(browser_id, ?health, "browser removed on checkin due to health");
            }
        }
        Ok(())
    }

    fn emit(&self, event_type: &str, browser_id: &str) {
        if let Some(bus) = &self.events {
            bus.emit(Event::new(
                event_type,
                "pool",
                EventSeverity::Info,
                serde_json::json!({ "browser_id": browser_id }),
            ));
        }
    }
}

pub struct BrowserPool {
    handle: PoolHandle,
    factory: Arc<dyn BrowserEngineFactory>,
    semaphore: Arc<Semaphore>,
    shutdown_tx: mpsc::Sender<()>,
    maintenance_task: tokio::task::JoinHandle<()>,
}

impl BrowserPool {
    pub async fn new(
        config: BrowserPoolConfig,
        factory: Arc<dyn BrowserEngineFactory>,
        events: Option<EventBus>,
    ) -> CoreResult<Self> {
        info!(
            min = config.min_pool_size,
            max = config.max_pool_size,
            initial = config.initial_pool_size,
            "initializing browser pool"
        );

        let mut initial = VecDeque::new();
        for attempt in 0..config.initial_pool_size {
            match factory.launch().await {
                Ok(engine) => initial.push_back(PooledBrowser::new(Uuid::new_v4().to_string(), engine)),
                Err(e) => warn!(attempt, error = %e, "failed to launch initial pool browser"),
            }
        }

        let handle = PoolHandle {
            available: Arc::new(Mutex::new(initial)),
            in_use: Arc::new(RwLock::new(HashMap::new())),
            config: config.clone(),
            events,
        };

        let semaphore = Arc::new(Semaphore::new(config.max_pool_size));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let maintenance_task = {
            let handle = handle.clone();
            let factory = factory.clone();
            tokio::spawn(async move {
                let mut fast_tick = interval(config.fast_check_interval);
                let mut full_tick = interval(config.full_check_interval);
                loop {
                    tokio::select! {
                        _ = fast_tick.tick() => {
                            Self::fast_sweep(&handle).await;
                        }
                        _ = full_tick.tick() => {
                            Self::full_sweep(&handle).await;
                            Self::maintain_min_size(&handle, &factory).await;
                        }
                        _ = shutdown_rx.recv() => {
                            info!("browser pool maintenance task shutting down");
                            break;
                        }
                    }
                }
            })
        };

        Ok(Self {
            handle,
            factory,
            semaphore,
            shutdown_tx,
            maintenance_task,
        })
    }

    async fn fast_sweep(handle: &PoolHandle) {
        let mut available = handle.available.lock().await;
        let mut dead = Vec::new();
        for (i, browser) in available.iter().enumerate() {
            if !browser.fast_health_check().await {
                dead.push(i);
            }
        }
        for &i in dead.iter().rev() {
            if let Some(mut browser) = available.remove(i) {
                browser.cleanup().await;
                warn!(browser_id = %browser.id, "removed dead browser during fast sweep");
            }
        }
    }

    async fn full_sweep(handle: &PoolHandle) {
        let mut available = handle.available.lock().await;
        let mut keep = VecDeque::new();
        while let Some(mut browser) = available.pop_front() {
            let expired = browser.is_expired(handle.config.max_lifetime);
            let idle = browser.is_idle(handle.config.idle_timeout);
            if expired || idle {
                browser.cleanup().await;
                handle.emit("pool.expired", &browser.id);
                continue;
            }
            let health = browser.full_health_check(handle.config.max_pages_per_browser).await;
            if health == BrowserHealth::Healthy {
                keep.push_back(browser);
            } else {
                browser.cleanup().await;
                handle.emit("pool.unhealthy", &browser.id);
            }
        }
        *available = keep;
    }

    async fn maintain_min_size(handle: &PoolHandle, factory: &Arc<dyn BrowserEngineFactory>) {
        let current = handle.available.lock().await.len() + handle.in_use.read().await.len();
        if current >= handle.config.min_pool_size {
            return;
        }
        for _ in current..handle.config.min_pool_size {
            match factory.launch().await {
                Ok(engine) => {
                    let browser = PooledBrowser::new(Uuid::new_v4().to_string(), engine);
                    handle.emit("pool.created", &browser.id);
                    handle.available.lock().await.push_back(browser);
                }
                Err(e) => {
                    error!(error = %e, "failed to replenish pool to minimum size");
                    break;
                }
            }
        }
    }

    pub async fn checkout(&self) -> CoreResult<BrowserCheckout> {
        let permit = tokio::time::timeout(
            self.handle.config.acquire_timeout,
            self.semaphore.clone().acquire_owned(),
        )
        .await
        .map_err(|_| CoreError::resource_exhausted("timed out waiting for a browser pool slot"))?
        .map_err(|_| CoreError::internal("browser pool semaphore closed"))?;

        let mut browser = self.handle.available.lock().await.pop_front();

        if browser.is_none() {
            debug!("no available browsers, launching a new instance");
            let engine = self.factory.launch().await.map_err(|e| {
                CoreError::resource_exhausted(format!("failed to launch browser: {e}"))
            })?;
            let new_browser = PooledBrowser::new(Uuid::new_v4().to_string(), engine);
            self.handle.emit("pool.created", &new_browser.id);
            browser = Some(new_browser);
        }

        let mut browser = browser.expect("checked above");
        browser.mark_checked_out();
        let browser_id = browser.id.clone();
        self.handle.in_use.write().await.insert(browser_id.clone(), browser);
        self.handle.emit("pool.checked_out", &browser_id);

        Ok(BrowserCheckout {
            browser_id,
            handle: self.handle.clone(),
            permit: Some(permit),
        })
    }

    pub async fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.handle.available.lock().await.len(),
            in_use: self.handle.in_use.read().await.len(),
            capacity: self.handle.config.max_pool_size,
        }
    }

    pub async fn shutdown(self) -> CoreResult<()> {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.maintenance_task.await;

        let mut available = self.handle.available.lock().await;
        while let Some(mut browser) = available.pop_front() {
            browser.cleanup().await;
        }
        let mut in_use = self.handle.in_use.write().await;
        for (_, mut browser) in in_use.drain() {
            browser.cleanup().await;
        }
        Ok(())
    }
}

/// A checked-out browser with automatic best-effort checkin on drop.
pub struct BrowserCheckout {
    browser_id: String,
    handle: PoolHandle,
    permit: Option<tokio::sync::OwnedSemaphorePermit>,
}

impl BrowserCheckout {
    pub fn browser_id(&self) -> &str {
        &self.browser_id
    }

    pub async fn new_page(&self) -> CoreResult<Arc<dyn BrowserPage>> {
        let in_use = self.handle.in_use.read().await;
        let browser = in_use
            .get(&self.browser_id)
            .ok_or_else(|| CoreError::not_found("checked-out browser no longer tracked by pool"))?;
        browser.engine.new_page().await
    }

    /// Manually check the browser back in; preferred over letting it drop.
    pub async fn checkin(mut self) -> CoreResult<()> {
        let result = self.handle.checkin(&self.browser_id).await;
        self.permit.take();
        result
    }
}

impl Drop for BrowserCheckout {
    fn drop(&mut self) {
        if self.permit.is_some() {
            warn!(browser_id = %self.browser_id, "checkout dropped without explicit checkin, cleaning up in background");
            let browser_id = self.browser_id.clone();
            let handle = self.handle.clone();
            tokio::spawn(async move {
                if let Err(e) = handle.checkin(&browser_id).await {
                    error!(browser_id, error = %e, "background checkin failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wayfarer_types::ports::engine::{
        BrowserEngine, BrowserPage, CookieSpec, NavigationOutcome, PdfOpts, ScreenshotOpts,
        ScrollSpec, WaitUntil,
    };

    struct FakePage;

    #[async_trait]
    impl BrowserPage for FakePage {
        async fn goto(&self, url: &str, _wait_until: WaitUntil, _timeout: std::time::Duration) -> CoreResult<NavigationOutcome> {
            Ok(NavigationOutcome { final_url: url.to_string(), status_code: 200, title: String::new() })
        }
        async fn go_back(&self, _timeout: std::time::Duration) -> CoreResult<bool> { Ok(false) }
        async fn go_forward(&self, _timeout: std::time::Duration) -> CoreResult<bool> { Ok(false) }
        async fn reload(&self, _timeout: std::time::Duration) -> CoreResult<NavigationOutcome> {
            Ok(NavigationOutcome { final_url: String::new(), status_code: 200, title: String::new() })
        }
        async fn evaluate(&self, _code: &str, _args: &[serde_json::Value], _timeout: std::time::Duration) -> CoreResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
        async fn evaluate_handle(&self, _code: &str, _args: &[serde_json::Value], _timeout: std::time::Duration) -> CoreResult<String> {
            Ok("handle".to_string())
        }
        async fn inject_script(&self, _code: &str, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn inject_css(&self, _code: &str, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn click(&self, _selector: &str, _wait_for_selector: bool, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn type_text(&self, _selector: &str, _text: &str, _clear_first: bool, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn scroll(&self, _spec: ScrollSpec, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn wait_for_selector(&self, _selector: &str, _visible: Option<bool>, _hidden: Option<bool>, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn wait_for_navigation(&self, _wait_until: WaitUntil, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn wait_for_function(&self, _body: &str, _timeout: std::time::Duration) -> CoreResult<()> { Ok(()) }
        async fn screenshot(&self, _opts: ScreenshotOpts) -> CoreResult<Vec<u8>> { Ok(vec![]) }
        async fn pdf(&self, _opts: PdfOpts) -> CoreResult<Vec<u8>> { Ok(vec![]) }
        async fn set_viewport(&self, width: u32, height: u32, _scale: f64) -> CoreResult<(u32, u32)> { Ok((width, height)) }
        async fn set_cookie(&self, _cookie: CookieSpec) -> CoreResult<()> { Ok(()) }
        async fn get_cookies(&self) -> CoreResult<Vec<CookieSpec>> { Ok(vec![]) }
        async fn delete_cookie(&self, _name: &str) -> CoreResult<()> { Ok(()) }
        async fn set_download_behavior(&self, _dir: &str) -> CoreResult<()> { Ok(()) }
        async fn get_content(&self) -> CoreResult<String> { Ok(String::new()) }
        async fn get_title(&self) -> CoreResult<String> { Ok(String::new()) }
        async fn get_url(&self) -> CoreResult<String> { Ok(String::new()) }
        async fn history_len(&self) -> usize { 0 }
        async fn upload_files(&self, _selector: &str, _files: &[String]) -> CoreResult<()> { Ok(()) }
        async fn close(&self) -> CoreResult<()> { Ok(()) }
    }

    struct FakeEngine {
        pages: AtomicUsize,
        alive: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl BrowserEngine for FakeEngine {
        async fn new_page(&self) -> CoreResult<Arc<dyn BrowserPage>> {
            self.pages.fetch_add(1, Ordering::Relaxed);
            Ok(Arc::new(FakePage))
        }
        async fn page_count(&self) -> usize {
            self.pages.load(Ordering::Relaxed)
        }
        async fn is_alive(&self) -> bool {
            self.alive.load(Ordering::Relaxed)
        }
        async fn close(&self) -> CoreResult<()> {
            self.alive.store(false, Ordering::Relaxed);
            Ok(())
        }
    }

    struct FakeFactory;

    #[async_trait]
    impl BrowserEngineFactory for FakeFactory {
        async fn launch(&self) -> CoreResult<Arc<dyn BrowserEngine>> {
            Ok(Arc::new(FakeEngine { pages: AtomicUsize::new(0), alive: std::sync::atomic::AtomicBool::new(true) }))
        }
    }

    fn test_config() -> BrowserPoolConfig {
        BrowserPoolConfig {
            min_pool_size: 0,
            max_pool_size: 2,
            initial_pool_size: 1,
            fast_check_interval: std::time::Duration::from_secs(3600),
            full_check_interval: std::time::Duration::from_secs(3600),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn checkout_then_checkin_returns_browser_to_available() {
        let pool = BrowserPool::new(test_config(), Arc::new(FakeFactory), None).await.unwrap();
        assert_eq!(pool.stats().await.available, 1);

        let checkout = pool.checkout().await.unwrap();
        assert_eq!(pool.stats().await.in_use, 1);

        checkout.checkin().await.unwrap();
        assert_eq!(pool.stats().await.available, 1);
        assert_eq!(pool.stats().await.in_use, 0);
    }

    #[tokio::test]
    async fn checkout_creates_new_browser_when_pool_empty() {
        let mut config = test_config();
        config.initial_pool_size = 0;
        let pool = BrowserPool::new(config, Arc::new(FakeFactory), None).await.unwrap();
        assert_eq!(pool.stats().await.available, 0);

        let checkout = pool.checkout().await.unwrap();
        let page = checkout.new_page().await.unwrap();
        assert_eq!(page.get_url().await.unwrap(), "");
    }

    #[tokio::test]
    async fn checkout_blocks_past_capacity_until_timeout() {
        let mut config = test_config();
        config.max_pool_size = 1;
        config.initial_pool_size = 1;
        config.acquire_timeout = std::time::Duration::from_millis(50);
        let pool = BrowserPool::new(config, Arc::new(FakeFactory), None).await.unwrap();

        let _held = pool.checkout().await.unwrap();
        let second = pool.checkout().await;
        assert!(second.is_err());
    }
}
