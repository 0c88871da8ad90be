//! Port traits: the seams every other `wayfarer-*` crate implements or
//! calls through, kept here so adapters never depend on each other directly.

pub mod audit;
pub mod circuit_breaker;
pub mod engine;
pub mod proxy;
pub mod session_backend;
pub mod strategy;

pub use audit::{AuditEvent, AuditSink};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry, CircuitState, CircuitStats};
pub use engine::{
    BrowserEngine, BrowserEngineFactory, BrowserPage, CookieSpec, NavigationOutcome, PdfOpts,
    ScreenshotOpts, ScrollSpec, WaitUntil,
};
pub use proxy::{ProxyManager, ProxyRotationReason, ProxySelector};
pub use session_backend::{HandleTable, SessionBackend};
pub use strategy::{
    BackoffStrategy, ExponentialBackoff, FixedBackoff, JitteredExponentialBackoff, LinearBackoff,
    RecyclingScorer,
};
