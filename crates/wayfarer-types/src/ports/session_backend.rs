//! Session/Context/Page store port (spec.md §4.5 / C5). A default in-memory
//! implementation and a Redis-shaped one live in `wayfarer-store`; front-ends
//! and the core facade only ever see this trait.

use crate::error::CoreResult;
use crate::model::{Context, ContextConfig, Page, Session};
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn create_session(
        &self,
        user_id: &str,
        roles: HashSet<String>,
        ttl: chrono::Duration,
    ) -> CoreResult<Session>;
    async fn get_session(&self, id: &str) -> CoreResult<Session>;
    async fn touch_session(&self, id: &str) -> CoreResult<()>;
    async fn list_sessions_for_user(&self, user_id: &str) -> CoreResult<Vec<Session>>;
    /// Cascades: deletes every context (and page) owned by this session.
    async fn delete_session(&self, id: &str) -> CoreResult<()>;

    async fn create_context(&self, session_id: &str, config: ContextConfig) -> CoreResult<Context>;
    async fn get_context(&self, id: &str) -> CoreResult<Context>;
    async fn touch_context(&self, id: &str) -> CoreResult<()>;
    async fn list_contexts_for_session(&self, session_id: &str) -> CoreResult<Vec<Context>>;
    /// Cascades: deletes every page owned by this context.
    async fn close_context(&self, id: &str) -> CoreResult<()>;

    async fn create_page(&self, context_id: &str, url: &str) -> CoreResult<Page>;
    async fn get_page(&self, id: &str) -> CoreResult<Page>;
    async fn update_page_url(&self, id: &str, url: &str) -> CoreResult<()>;
    async fn list_pages_for_context(&self, context_id: &str) -> CoreResult<Vec<Page>>;
    async fn close_page(&self, id: &str) -> CoreResult<()>;

    /// Sweep callable by the background maintenance loop; returns ids removed.
    async fn evict_expired(&self) -> CoreResult<Vec<String>>;
}

/// Table of `evaluateHandle` results, scoped to a session and cleaned up
/// alongside it. Kept separate from `SessionBackend` since not every backend
/// needs to persist handles durably.
#[async_trait]
pub trait HandleTable: Send + Sync {
    async fn store(&self, session_id: &str, value: serde_json::Value) -> String;
    async fn resolve(&self, handle_id: &str) -> CoreResult<serde_json::Value>;
    async fn release(&self, handle_id: &str);
    async fn release_all_for_session(&self, session_id: &str);
}
