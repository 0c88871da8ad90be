//! Fans a single audit event out to every configured sink, so a deployment
//! can log to `tracing` and publish onto the event bus at the same time.

use async_trait::async_trait;
use std::sync::Arc;
use wayfarer_types::ports::{AuditEvent, AuditSink};

pub struct CompositeAuditSink {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl CompositeAuditSink {
    pub fn new(sinks: Vec<Arc<dyn AuditSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl AuditSink for CompositeAuditSink {
    async fn emit(&self, event: AuditEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}
