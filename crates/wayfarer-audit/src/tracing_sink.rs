//! Default audit sink: writes every event through `tracing` so it reaches
//! whatever log aggregator the deployment already ships logs to. Retry
//! attempts and terminal retry-cap events are distinguished only by
//! `event_type`, matching the wire shape every other sink sees.

use async_trait::async_trait;
use tracing::{info, warn};
use wayfarer_types::ports::{AuditEvent, AuditSink};

pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn emit(&self, event: AuditEvent) {
        let is_warning = event.event_type.ends_with(".rejected")
            || event.event_type.ends_with(".violation")
            || event.event_type.ends_with(".terminal");

        if is_warning {
            warn!(
                event_type = %event.event_type,
                session_id = event.session_id.as_deref().unwrap_or("-"),
                payload = %event.payload,
                "security audit event"
            );
        } else {
            info!(
                event_type = %event.event_type,
                session_id = event.session_id.as_deref().unwrap_or("-"),
                payload = %event.payload,
                "security audit event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_types::ports::AuditEvent;

    #[tokio::test]
    async fn emit_does_not_panic_on_missing_session() {
        let sink = TracingAuditSink;
        sink.emit(AuditEvent::new("action.rejected", None, serde_json::json!({}))).await;
    }
}
