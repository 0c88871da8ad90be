//! In-memory session/context/page store.
//!
//! Single-process only: state is lost on restart and nothing here is
//! shared across instances. Suitable for a single control-plane node or for
//! tests; a durable backend would implement the same `SessionBackend` trait
//! against Redis or Postgres instead.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::model::{Context, ContextConfig, ContextStatus, Page, Session};
use wayfarer_types::ports::SessionBackend;

pub struct MemorySessionBackend {
    sessions: DashMap<String, Session>,
    contexts: DashMap<String, Context>,
    pages: DashMap<String, Page>,
    /// Reverse index: session -> its context ids, context -> its page ids.
    contexts_by_session: DashMap<String, HashSet<String>>,
    pages_by_context: DashMap<String, HashSet<String>>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            contexts: DashMap::new(),
            pages: DashMap::new(),
            contexts_by_session: DashMap::new(),
            pages_by_context: DashMap::new(),
        }
    }
}

impl Default for MemorySessionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn create_session(
        &self,
        user_id: &str,
        roles: HashSet<String>,
        ttl: chrono::Duration,
    ) -> CoreResult<Session> {
        let session = Session::new(user_id, roles, ttl);
        self.sessions.insert(session.id.clone(), session.clone());
        self.contexts_by_session.insert(session.id.clone(), HashSet::new());
        debug!(session_id = %session.id, user_id, "session created");
        Ok(session)
    }

    async fn get_session(&self, id: &str) -> CoreResult<Session> {
        self.sessions
            .get(id)
            .map(|e| e.clone())
            .ok_or_else(|| CoreError::not_found(format!("session {id} not found")))
    }

    async fn touch_session(&self, id: &str) -> CoreResult<()> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(format!("session {id} not found")))?;
        session.touch();
        Ok(())
    }

    async fn list_sessions_for_user(&self, user_id: &str) -> CoreResult<Vec<Session>> {
        Ok(self
            .sessions
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.clone())
            .collect())
    }

    async fn delete_session(&self, id: &str) -> CoreResult<()> {
        if self.sessions.remove(id).is_none() {
            return Err(CoreError::not_found(format!("session {id} not found")));
        }
        if let Some((_, context_ids)) = self.contexts_by_session.remove(id) {
            for context_id in context_ids {
                self.close_context(&context_id).await.ok();
            }
        }
        debug!(session_id = id, "session deleted, cascaded to contexts");
        Ok(())
    }

    async fn create_context(&self, session_id: &str, config: ContextConfig) -> CoreResult<Context> {
        if !self.sessions.contains_key(session_id) {
            return Err(CoreError::not_found(format!("session {session_id} not found")));
        }
        let context = Context::new(session_id, config);
        self.contexts.insert(context.id.clone(), context.clone());
        self.pages_by_context.insert(context.id.clone(), HashSet::new());
        self.contexts_by_session
            .entry(session_id.to_string())
            .or_default()
            .insert(context.id.clone());
        Ok(context)
    }

    async fn get_context(&self, id: &str) -> CoreResult<Context> {
        self.contexts
            .get(id)
            .map(|e| e.clone())
            .ok_or_else(|| CoreError::not_found(format!("context {id} not found")))
    }

    async fn touch_context(&self, id: &str) -> CoreResult<()> {
        let mut context = self
            .contexts
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(format!("context {id} not found")))?;
        context.last_used_at = chrono::Utc::now();
        Ok(())
    }

    async fn list_contexts_for_session(&self, session_id: &str) -> CoreResult<Vec<Context>> {
        let ids = self
            .contexts_by_session
            .get(session_id)
            .map(|e| e.clone())
            .unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.contexts.get(&id).map(|e| e.clone()))
            .collect())
    }

    async fn close_context(&self, id: &str) -> CoreResult<()> {
        let mut context = self
            .contexts
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(format!("context {id} not found")))?;
        context.status = ContextStatus::Closed;
        drop(context);

        if let Some((_, page_ids)) = self.pages_by_context.remove(id) {
            for page_id in page_ids {
                self.pages.remove(&page_id);
            }
        }
        if let Some(mut siblings) = self.contexts_by_session.get_mut(
            &self.contexts.get(id).map(|c| c.session_id.clone()).unwrap_or_default(),
        ) {
            siblings.remove(id);
        }
        debug!(context_id = id, "context closed, cascaded to pages");
        Ok(())
    }

    async fn create_page(&self, context_id: &str, url: &str) -> CoreResult<Page> {
        if !self.contexts.contains_key(context_id) {
            return Err(CoreError::not_found(format!("context {context_id} not found")));
        }
        let page = Page::new(context_id, url);
        self.pages.insert(page.id.clone(), page.clone());
        self.pages_by_context
            .entry(context_id.to_string())
            .or_default()
            .insert(page.id.clone());
        Ok(page)
    }

    async fn get_page(&self, id: &str) -> CoreResult<Page> {
        self.pages
            .get(id)
            .map(|e| e.clone())
            .ok_or_else(|| CoreError::not_found(format!("page {id} not found")))
    }

    async fn update_page_url(&self, id: &str, url: &str) -> CoreResult<()> {
        let mut page = self
            .pages
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(format!("page {id} not found")))?;
        page.url = url.to_string();
        Ok(())
    }

    async fn list_pages_for_context(&self, context_id: &str) -> CoreResult<Vec<Page>> {
        let ids = self
            .pages_by_context
            .get(context_id)
            .map(|e| e.clone())
            .unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| self.pages.get(&id).map(|e| e.clone()))
            .collect())
    }

    async fn close_page(&self, id: &str) -> CoreResult<()> {
        let page = self
            .pages
            .remove(id)
            .ok_or_else(|| CoreError::not_found(format!("page {id} not found")))?;
        if let Some(mut siblings) = self.pages_by_context.get_mut(&page.1.context_id) {
            siblings.remove(id);
        }
        Ok(())
    }

    async fn evict_expired(&self) -> CoreResult<Vec<String>> {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|e| e.is_expired())
            .map(|e| e.id.clone())
            .collect();
        for id in &expired {
            self.delete_session(id).await.ok();
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "evicted expired sessions");
        }
        Ok(expired)
    }
}

pub type SharedSessionBackend = Arc<dyn SessionBackend>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deleting_session_cascades_to_contexts_and_pages() {
        let store = MemorySessionBackend::new();
        let session = store
            .create_session("user-1", HashSet::new(), chrono::Duration::seconds(60))
            .await
            .unwrap();
        let context = store
            .create_context(&session.id, ContextConfig::default())
            .await
            .unwrap();
        let page = store.create_page(&context.id, "https://example.com").await.unwrap();

        store.delete_session(&session.id).await.unwrap();

        assert!(store.get_context(&context.id).await.is_err());
        assert!(store.get_page(&page.id).await.is_err());
    }

    #[tokio::test]
    async fn closing_context_cascades_to_pages_but_not_session() {
        let store = MemorySessionBackend::new();
        let session = store
            .create_session("user-1", HashSet::new(), chrono::Duration::seconds(60))
            .await
            .unwrap();
        let context = store
            .create_context(&session.id, ContextConfig::default())
            .await
            .unwrap();
        let page = store.create_page(&context.id, "https://example.com").await.unwrap();

        store.close_context(&context.id).await.unwrap();

        assert!(store.get_page(&page.id).await.is_err());
        assert!(store.get_session(&session.id).await.is_ok());
    }

    #[tokio::test]
    async fn evict_expired_removes_only_expired_sessions() {
        let store = MemorySessionBackend::new();
        let fresh = store
            .create_session("u", HashSet::new(), chrono::Duration::seconds(3600))
            .await
            .unwrap();
        let stale = store
            .create_session("u", HashSet::new(), chrono::Duration::seconds(-1))
            .await
            .unwrap();

        let evicted = store.evict_expired().await.unwrap();

        assert_eq!(evicted, vec![stale.id]);
        assert!(store.get_session(&fresh.id).await.is_ok());
    }
}
