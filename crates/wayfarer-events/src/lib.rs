//! Broadcast event bus shared by the pool, reliability, proxy and audit
//! components for lifecycle notifications and the security audit trail.

pub mod audit;
pub mod bus;

pub use audit::BusAuditSink;
pub use bus::{Event, EventBus, EventBusConfig, EventBusStats, EventSeverity, EventSubscription};
