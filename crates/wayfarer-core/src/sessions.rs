//! Session/context/page CRUD, the part of the Control API that doesn't
//! touch a browser (spec.md §4.7 / C5).

use crate::plane::ControlPlane;
use std::collections::HashSet;
use wayfarer_types::error::CoreResult;
use wayfarer_types::model::{Context, ContextConfig, Page, Session};
use wayfarer_types::ports::{HandleTable, SessionBackend};

impl ControlPlane {
    pub async fn create_session(&self, user_id: &str, roles: HashSet<String>) -> CoreResult<Session> {
        self.store.create_session(user_id, roles, self.session_ttl).await
    }

    pub async fn get_session(&self, id: &str) -> CoreResult<Session> {
        self.store.get_session(id).await
    }

    pub async fn list_sessions_for_user(&self, user_id: &str) -> CoreResult<Vec<Session>> {
        self.store.list_sessions_for_user(user_id).await
    }

    /// Cascades to every context/page the session owns, releases its
    /// evaluate-handles, and checks in any browser leases still held by
    /// its contexts (spec.md §9 supplement 5).
    pub async fn delete_session(&self, id: &str) -> CoreResult<()> {
        let contexts = self.store.list_contexts_for_session(id).await.unwrap_or_default();
        for context in &contexts {
            self.release_context_lease(&context.id).await;
        }
        self.store.delete_session(id).await?;
        self.handles.release_all_for_session(id).await;
        Ok(())
    }

    pub async fn create_context(&self, session_id: &str, config: ContextConfig) -> CoreResult<Context> {
        self.store.create_context(session_id, config).await
    }

    pub async fn get_context(&self, id: &str) -> CoreResult<Context> {
        self.store.get_context(id).await
    }

    pub async fn list_contexts_for_session(&self, session_id: &str) -> CoreResult<Vec<Context>> {
        self.store.list_contexts_for_session(session_id).await
    }

    pub async fn close_context(&self, id: &str) -> CoreResult<()> {
        self.release_context_lease(id).await;
        self.store.close_context(id).await
    }

    pub async fn get_page(&self, id: &str) -> CoreResult<Page> {
        self.store.get_page(id).await
    }

    pub async fn list_pages_for_context(&self, context_id: &str) -> CoreResult<Vec<Page>> {
        self.store.list_pages_for_context(context_id).await
    }

    /// Periodic sweep entry point; returns the ids of everything evicted.
    pub async fn evict_expired(&self) -> CoreResult<Vec<String>> {
        self.store.evict_expired().await
    }
}
