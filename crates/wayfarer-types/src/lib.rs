//! Shared data model, error kinds and port traits for the browser automation
//! control plane. Every other `wayfarer-*` crate depends on this one and
//! nothing in here depends back on them.

pub mod action;
pub mod error;
pub mod model;
pub mod ports;

pub use action::{Action, ActionResult};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use model::{
    BrowserInstanceInfo, BrowserState, Context, ContextConfig, ContextStatus, Page, ProxyConfig,
    ProxyHealth, ProxyInstance, ProxyMetrics, ProxyProtocol, Session, Viewport,
};
