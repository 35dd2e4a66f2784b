//! Domain event system: observe turn outcomes without coupling to them.
//!
//! The coordinator publishes an event whenever it skips a perception,
//! abandons a turn, reacts, dispatches a message part, or completes a turn.
//! Hosts and tests subscribe to follow what happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Admission control declined a perception
    PerceptionSkipped {
        user: String,
        reason: String,
        pending: usize,
        timestamp: DateTime<Utc>,
    },

    /// A turn was dropped after its parallel decision phase
    TurnAbandoned {
        user: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// An emoji reaction was dispatched
    ReactionDispatched {
        user: String,
        emoji: String,
        timestamp: DateTime<Utc>,
    },

    /// One part of a (possibly multi-part) reply was dispatched
    MessagePartDispatched {
        user: String,
        part: usize,
        total: usize,
        max_words: usize,
        timestamp: DateTime<Utc>,
    },

    /// A turn finished emitting
    TurnCompleted {
        user: String,
        parts: usize,
        welcome: bool,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Short event name for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PerceptionSkipped { .. } => "perception_skipped",
            Self::TurnAbandoned { .. } => "turn_abandoned",
            Self::ReactionDispatched { .. } => "reaction_dispatched",
            Self::MessagePartDispatched { .. } => "message_part_dispatched",
            Self::TurnCompleted { .. } => "turn_completed",
        }
    }
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
