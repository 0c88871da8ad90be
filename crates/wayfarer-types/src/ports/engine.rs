//! Browser-engine port (spec.md §6): the core treats a browser instance as
//! an opaque capability. Everything here is a trait — the real
//! implementation (CDP over a real browser process) lives outside this
//! workspace's scope; tests substitute a fake satisfying the same trait.

use crate::error::CoreResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::action::{PdfFormat, PdfMargins, ScreenshotFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Load,
    DomContentLoaded,
    NetworkIdle0,
    NetworkIdle2,
}

#[derive(Debug, Clone)]
pub struct NavigationOutcome {
    pub final_url: String,
    pub status_code: u16,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenshotOpts {
    pub format: Option<ScreenshotFormat>,
    pub quality: Option<u8>,
    pub clip: Option<(i64, i64, i64, i64)>,
    pub full_page: bool,
    pub selector: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfOpts {
    pub format: PdfFormat,
    pub landscape: bool,
    pub scale: f64,
    pub margins: PdfMargins,
    pub page_ranges: Option<String>,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CookieSpec {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScrollSpec {
    pub selector: Option<String>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub direction: Option<&'static str>,
    pub smooth: bool,
}

/// A single tab within a browser process.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(
        &self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> CoreResult<NavigationOutcome>;

    /// Returns `false` when history length <= 1 (nothing to go back to).
    async fn go_back(&self, timeout: Duration) -> CoreResult<bool>;
    /// Returns `false` when history length <= 1.
    async fn go_forward(&self, timeout: Duration) -> CoreResult<bool>;
    async fn reload(&self, timeout: Duration) -> CoreResult<NavigationOutcome>;

    async fn evaluate(&self, code: &str, args: &[Value], timeout: Duration) -> CoreResult<Value>;
    /// Returns an opaque handle id tracked by the caller, not the engine.
    async fn evaluate_handle(
        &self,
        code: &str,
        args: &[Value],
        timeout: Duration,
    ) -> CoreResult<String>;
    async fn inject_script(&self, code: &str, timeout: Duration) -> CoreResult<()>;
    async fn inject_css(&self, code: &str, timeout: Duration) -> CoreResult<()>;

    async fn click(&self, selector: &str, wait_for_selector: bool, timeout: Duration)
        -> CoreResult<()>;
    async fn type_text(
        &self,
        selector: &str,
        text: &str,
        clear_first: bool,
        timeout: Duration,
    ) -> CoreResult<()>;
    async fn scroll(&self, spec: ScrollSpec, timeout: Duration) -> CoreResult<()>;

    async fn wait_for_selector(
        &self,
        selector: &str,
        visible: Option<bool>,
        hidden: Option<bool>,
        timeout: Duration,
    ) -> CoreResult<()>;
    async fn wait_for_navigation(&self, wait_until: WaitUntil, timeout: Duration) -> CoreResult<()>;
    async fn wait_for_function(&self, body: &str, timeout: Duration) -> CoreResult<()>;

    async fn screenshot(&self, opts: ScreenshotOpts) -> CoreResult<Vec<u8>>;
    async fn pdf(&self, opts: PdfOpts) -> CoreResult<Vec<u8>>;

    async fn set_viewport(&self, width: u32, height: u32, scale: f64) -> CoreResult<(u32, u32)>;
    async fn set_cookie(&self, cookie: CookieSpec) -> CoreResult<()>;
    async fn get_cookies(&self) -> CoreResult<Vec<CookieSpec>>;
    async fn delete_cookie(&self, name: &str) -> CoreResult<()>;
    async fn set_download_behavior(&self, dir: &str) -> CoreResult<()>;

    async fn get_content(&self) -> CoreResult<String>;
    async fn get_title(&self) -> CoreResult<String>;
    async fn get_url(&self) -> CoreResult<String>;
    async fn history_len(&self) -> usize;

    async fn upload_files(&self, selector: &str, files: &[String]) -> CoreResult<()>;

    async fn close(&self) -> CoreResult<()>;
}

/// A running browser process.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn new_page(&self) -> CoreResult<Arc<dyn BrowserPage>>;
    async fn page_count(&self) -> usize;
    /// Quick liveness probe used by fast health checks.
    async fn is_alive(&self) -> bool;
    async fn close(&self) -> CoreResult<()>;
}

/// Factory the pool uses to launch new browser processes. Swappable for a
/// fake in tests so the pool's lifecycle logic never needs a real browser.
#[async_trait]
pub trait BrowserEngineFactory: Send + Sync {
    async fn launch(&self) -> CoreResult<Arc<dyn BrowserEngine>>;
}
