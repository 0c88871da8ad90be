//! Core data model: Session, Context, Page, BrowserInstance, ProxyInstance.
//!
//! See spec.md §3. IDs are UUID-v4 text, timestamps are `DateTime<Utc>` for
//! anything that crosses a wire boundary; purely in-process age/idle
//! comparisons use `std::time::Instant` inside the owning component instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// An authenticated principal's workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub roles: HashSet<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, roles: HashSet<String>, ttl: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            roles,
            created_at: now,
            expires_at: now + ttl,
            last_accessed_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// Bump `last_accessed_at` only; never shortens the session's lifetime.
    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// A logical browser configuration owned by exactly one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub geolocation: Option<(f64, f64)>,
    pub permissions: HashSet<String>,
    pub http_credentials: Option<(String, String)>,
    pub ignore_tls_errors: bool,
    pub javascript_enabled: bool,
    pub bypass_csp: bool,
    pub extra_headers: HashMap<String, String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            user_agent: None,
            locale: None,
            timezone: None,
            geolocation: None,
            permissions: HashSet::new(),
            http_credentials: None,
            ignore_tls_errors: false,
            javascript_enabled: true,
            bypass_csp: false,
            extra_headers: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    pub session_id: String,
    pub config: ContextConfig,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub status: ContextStatus,
}

impl Context {
    pub fn new(session_id: impl Into<String>, config: ContextConfig) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            session_id: session_id.into(),
            config,
            created_at: now,
            last_used_at: now,
            status: ContextStatus::Active,
        }
    }
}

/// A tab within a browser, owned by a context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub context_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Page {
    pub fn new(context_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            context_id: context_id.into(),
            url: url.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserState {
    Idle,
    InUse,
    Unhealthy,
    Draining,
    Closed,
}

/// An opaque, stateful browser-process capability, as tracked by the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserInstanceInfo {
    pub id: String,
    pub pid: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub acquired_by: Option<String>,
    pub page_count: u32,
    pub use_count: u64,
    pub last_used_at: DateTime<Utc>,
    pub health_score: f64,
    pub state: BrowserState,
}

impl BrowserInstanceInfo {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            pid: None,
            created_at: now,
            acquired_by: None,
            page_count: 0,
            use_count: 0,
            last_used_at: now,
            health_score: 1.0,
            state: BrowserState::Idle,
        }
    }
}

impl Default for BrowserInstanceInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bypass_list: Vec<String>,
}

impl ProxyConfig {
    /// `scheme://[user:pass@]host:port` form consumed by the HTTP client.
    pub fn to_url(&self) -> String {
        let scheme = match self.protocol {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        };
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => format!("{scheme}://{u}:{p}@{}:{}", self.host, self.port),
            _ => format!("{scheme}://{}:{}", self.host, self.port),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyHealth {
    pub healthy: bool,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub last_checked: DateTime<Utc>,
}

impl Default for ProxyHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
            last_error: None,
            last_checked: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProxyMetrics {
    pub request_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub avg_response_time_ms: f64,
    pub last_used: Option<DateTime<Utc>>,
}

impl ProxyMetrics {
    pub fn success_rate(&self) -> f64 {
        if self.request_count == 0 {
            1.0
        } else {
            self.success_count as f64 / self.request_count as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyInstance {
    pub id: String,
    pub config: ProxyConfig,
    pub health: ProxyHealth,
    pub metrics: ProxyMetrics,
}

impl ProxyInstance {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            id: new_id(),
            config,
            health: ProxyHealth::default(),
            metrics: ProxyMetrics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_touch_never_shortens_lifetime() {
        let mut s = Session::new("u1", HashSet::new(), chrono::Duration::seconds(60));
        let expires_before = s.expires_at;
        s.touch();
        assert_eq!(s.expires_at, expires_before);
    }

    #[test]
    fn proxy_url_includes_credentials() {
        let cfg = ProxyConfig {
            protocol: ProxyProtocol::Http,
            host: "proxy.example".into(),
            port: 8080,
            username: Some("u".into()),
            password: Some("p".into()),
            bypass_list: vec![],
        };
        assert_eq!(cfg.to_url(), "http://u:p@proxy.example:8080");
    }
}
