//! Security audit sink.

pub mod composite;
pub mod tracing_sink;

pub use composite::CompositeAuditSink;
pub use tracing_sink::TracingAuditSink;
