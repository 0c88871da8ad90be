//! In-memory `evaluateHandle` result table, scoped per session.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use wayfarer_types::error::{CoreError, CoreResult};
use wayfarer_types::model::new_id;
use wayfarer_types::ports::HandleTable;

pub struct MemoryHandleTable {
    values: DashMap<String, serde_json::Value>,
    by_session: DashMap<String, HashSet<String>>,
}

impl MemoryHandleTable {
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
            by_session: DashMap::new(),
        }
    }
}

impl Default for MemoryHandleTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HandleTable for MemoryHandleTable {
    async fn store(&self, session_id: &str, value: serde_json::Value) -> String {
        let handle_id = new_id();
        self.values.insert(handle_id.clone(), value);
        self.by_session
            .entry(session_id.to_string())
            .or_default()
            .insert(handle_id.clone());
        handle_id
    }

    async fn resolve(&self, handle_id: &str) -> CoreResult<serde_json::Value> {
        self.values
            .get(handle_id)
            .map(|e| e.clone())
            .ok_or_else(|| CoreError::not_found(format!("handle {handle_id} not found")))
    }

    async fn release(&self, handle_id: &str) {
        self.values.remove(handle_id);
    }

    async fn release_all_for_session(&self, session_id: &str) {
        if let Some((_, handle_ids)) = self.by_session.remove(session_id) {
            for id in handle_ids {
                self.values.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn release_all_for_session_drops_every_handle() {
        let table = MemoryHandleTable::new();
        let a = table.store("s1", serde_json::json!(1)).await;
        let b = table.store("s1", serde_json::json!(2)).await;

        table.release_all_for_session("s1").await;

        assert!(table.resolve(&a).await.is_err());
        assert!(table.resolve(&b).await.is_err());
    }
}
