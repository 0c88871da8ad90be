//! Security audit sink port (spec.md §4.9 / C9).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub session_id: Option<String>,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(event_type: &str, session_id: Option<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            session_id,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only sink. Implementations must not drop events on backpressure —
/// slow subscribers lag rather than lose entries (spec.md's ordering note).
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: AuditEvent);
}
