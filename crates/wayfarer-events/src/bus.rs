//! Broadcast-based event bus. Every subscriber gets its own receiver off a
//! `tokio::sync::broadcast` channel, so delivery order within one subscriber
//! is always FIFO even though subscribers run independently of each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

/// A single notification on the bus: lifecycle transitions (pool, breaker,
/// proxy) and security-audit entries both travel as this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub source: String,
    pub severity: EventSeverity,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, severity: EventSeverity, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            source: source.into(),
            severity,
            payload,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    pub buffer_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self { buffer_size: 1024 }
    }
}

#[derive(Debug, Clone)]
pub struct EventBusStats {
    pub buffer_size: usize,
    pub current_subscribers: usize,
    pub total_emitted: u64,
}

/// A filtered view onto the bus, held by exactly one consumer.
pub struct EventSubscription {
    receiver: broadcast::Receiver<Arc<Event>>,
    type_prefixes: Vec<String>,
    min_severity: EventSeverity,
}

impl EventSubscription {
    fn matches(&self, event: &Event) -> bool {
        if event.severity < self.min_severity {
            return false;
        }
        if self.type_prefixes.is_empty() {
            return true;
        }
        self.type_prefixes.iter().any(|p| {
            if let Some(prefix) = p.strip_suffix('*') {
                event.event_type.starts_with(prefix)
            } else {
                event.event_type == *p
            }
        })
    }

    /// Waits for the next event matching this subscription's filter.
    /// Returns `None` once the bus is dropped and the channel closes.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged_events = %count, "event subscription lagged, skipping to latest");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Central event bus. Cheap to clone (the sender is an `Arc` internally).
#[derive(Clone)]
pub struct EventBus {
    config: EventBusConfig,
    sender: broadcast::Sender<Arc<Event>>,
    emitted_total: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _receiver) = broadcast::channel(config.buffer_size);
        Self {
            config,
            sender,
            emitted_total: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscribe(&self, type_prefixes: Vec<String>, min_severity: EventSeverity) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
            type_prefixes,
            min_severity,
        }
    }

    /// Publishes an event. Returns the number of subscribers it reached;
    /// zero subscribers is not an error — the bus has no durable log.
    pub fn emit(&self, event: Event) -> usize {
        self.emitted_total.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(Arc::new(event)) {
            Ok(count) => {
                debug!(subscribers = %count, "event emitted");
                count
            }
            Err(_) => {
                debug!("event emitted with no active subscribers");
                0
            }
        }
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            buffer_size: self.config.buffer_size,
            current_subscribers: self.sender.receiver_count(),
            total_emitted: self.emitted_total.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
