//! Perceptions: inbound events the soul must decide how to react to.
//!
//! A perception is one message, join, or reaction from the platform. They
//! arrive on an unbounded, time-ordered [`PerceptionQueue`]; the host runtime
//! pops one at a time (the *invoking* perception) while the rest stay
//! *pending*. The turn policy only ever reads snapshots of the pending set.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The action name a platform join is reported with.
pub const JOINED_ACTION: &str = "joined";

/// What happened on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformEventKind {
    /// A user posted a message
    MessageCreate,
    /// A user joined the server
    Joined,
    /// A user reacted to a message
    ReactionAdd,
}

/// Platform-specific routing metadata attached to a perception.
///
/// Carried through untouched onto outbound actions so the platform
/// integration can route replies and reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEvent {
    pub kind: PlatformEventKind,

    /// Message the event refers to (reply / react target)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    pub channel_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,

    pub user_id: String,

    /// Stable handle of the user; used as their identity
    pub user_name: String,

    /// Human-readable display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_display_name: Option<String>,
}

/// An inbound event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perception {
    /// Unique perception ID
    #[serde(default = "new_id")]
    pub id: String,

    /// Action classification ("said", "joined", ...)
    pub action: String,

    /// Free-text content
    #[serde(default)]
    pub content: String,

    /// Origin name as reported by the host (fallback identity)
    pub name: String,

    /// Platform metadata; absent when running outside the live platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<PlatformEvent>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Perception {
    /// A plain "said" perception with no platform metadata.
    pub fn said(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            action: "said".into(),
            content: content.into(),
            name: name.into(),
            event: None,
            created_at: Utc::now(),
        }
    }

    /// Attach platform metadata.
    pub fn with_event(mut self, event: PlatformEvent) -> Self {
        self.event = Some(event);
        self
    }

    /// The identity of whoever caused this perception.
    pub fn user_name(&self) -> &str {
        self.event
            .as_ref()
            .map_or(self.name.as_str(), |event| event.user_name.as_str())
    }

    /// Whether this perception came from the live platform.
    pub fn is_from_platform(&self) -> bool {
        self.event.is_some()
    }

    /// Whether the platform reported this as a join.
    pub fn is_platform_join(&self) -> bool {
        match &self.event {
            Some(event) => event.kind == PlatformEventKind::Joined || self.action == JOINED_ACTION,
            None => false,
        }
    }
}

/// Read access to the perceptions that are queued but not yet started.
///
/// Implementations must return a fresh snapshot on every call: the turn
/// policy calls this more than once per turn and relies on seeing growth.
pub trait PendingPerceptions: Send + Sync {
    fn pending(&self) -> Vec<Perception>;
}

/// An unbounded FIFO of perceptions, shared between producers and the runtime.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct PerceptionQueue {
    inner: Arc<Mutex<VecDeque<Perception>>>,
}

impl PerceptionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a perception at the back.
    pub fn push(&self, perception: Perception) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(perception);
    }

    /// Take the oldest perception, making it the invoking one.
    pub fn pop(&self) -> Option<Perception> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PendingPerceptions for PerceptionQueue {
    fn pending(&self) -> Vec<Perception> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for PerceptionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerceptionQueue").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discord_event(user: &str, kind: PlatformEventKind) -> PlatformEvent {
        PlatformEvent {
            kind,
            message_id: Some("m1".into()),
            channel_id: "general".into(),
            guild_id: None,
            user_id: format!("{user}-id"),
            user_name: user.into(),
            user_display_name: Some(user.to_uppercase()),
        }
    }

    #[test]
    fn user_name_prefers_platform_identity() {
        let local = Perception::said("alice", "hi");
        assert_eq!(local.user_name(), "alice");

        let remote = Perception::said("webhook", "hi")
            .with_event(discord_event("bob", PlatformEventKind::MessageCreate));
        assert_eq!(remote.user_name(), "bob");
        assert!(remote.is_from_platform());
    }

    #[test]
    fn platform_join_detection() {
        let join = Perception::said("bob", "")
            .with_event(discord_event("bob", PlatformEventKind::Joined));
        assert!(join.is_platform_join());

        let mut by_action = Perception::said("bob", "")
            .with_event(discord_event("bob", PlatformEventKind::MessageCreate));
        by_action.action = JOINED_ACTION.into();
        assert!(by_action.is_platform_join());

        assert!(!Perception::said("bob", "JOINED").is_platform_join());
    }

    #[test]
    fn queue_is_fifo_and_snapshots_pending() {
        let queue = PerceptionQueue::new();
        queue.push(Perception::said("a", "1"));
        queue.push(Perception::said("b", "2"));

        let producer = queue.clone();
        let snapshot = queue.pending();
        producer.push(Perception::said("c", "3"));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(queue.pending().len(), 3);
        assert_eq!(queue.pop().unwrap().content, "1");
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn perception_deserializes_with_defaults() {
        let json = r#"{"action":"said","name":"alice","content":"hello"}"#;
        let perception: Perception = serde_json::from_str(json).unwrap();
        assert!(!perception.id.is_empty());
        assert!(perception.event.is_none());
    }
}
