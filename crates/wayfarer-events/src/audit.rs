//! Adapts the event bus to the [`wayfarer_types::ports::AuditSink`] port so
//! the action executor and validator chain can emit audit entries without
//! depending on the bus directly.

use crate::bus::{Event, EventBus, EventSeverity};
use async_trait::async_trait;
use wayfarer_types::ports::{AuditEvent, AuditSink};

pub struct BusAuditSink {
    bus: EventBus,
}

impl BusAuditSink {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl AuditSink for BusAuditSink {
    async fn emit(&self, event: AuditEvent) {
        let severity = if event.event_type.ends_with(".rejected")
            || event.event_type.ends_with(".violation")
        {
            EventSeverity::Warn
        } else {
            EventSeverity::Info
        };
        self.bus.emit(Event::new(
            format!("audit.{}", event.event_type),
            event.session_id.as_deref().unwrap_or("unknown"),
            severity,
            event.payload,
        ));
    }
}
