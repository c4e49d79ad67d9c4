//! Domain event system — lets the UI observe the session without polling.
//!
//! The session publishes events when its state changes. Renderers,
//! loggers and tests subscribe and react without being coupled to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A batch of artifacts was added to the pool
    ArtifactsIngested {
        loaded: usize,
        failed: usize,
        pool_size: usize,
        timestamp: DateTime<Utc>,
    },

    /// The pin set changed
    PinsChanged {
        pinned: usize,
        timestamp: DateTime<Utc>,
    },

    /// The conversation mode changed
    ModeChanged {
        mode: String,
        timestamp: DateTime<Utc>,
    },

    /// A request was composed and handed to the transport
    GenerationStarted {
        query_preview: String,
        context_tokens: usize,
        history_turns: usize,
        timestamp: DateTime<Utc>,
    },

    /// A generation reached a terminal state
    GenerationFinished {
        status: String, // "completed", "aborted", "failed"
        tokens_out: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Pool, pins and history were cleared
    SessionReset { timestamp: DateTime<Utc> },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
