//! In-memory slot store: useful for testing and ephemeral sessions.

use soulturn_core::error::MemoryError;
use soulturn_core::memory::SlotStore;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// An in-memory slot store backed by a `HashMap`.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Default)]
pub struct InMemorySlots {
    slots: RwLock<HashMap<String, serde_json::Value>>,
}

impl InMemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots that have been written.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SlotStore for InMemorySlots {
    fn name(&self) -> &str {
        "in_memory"
    }

    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, MemoryError> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn save(&self, key: &str, value: serde_json::Value) -> Result<(), MemoryError> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unset_slot_is_none() {
        let slots = InMemorySlots::new();
        assert!(slots.load("alice").unwrap().is_none());
        assert!(slots.is_empty());
    }

    #[test]
    fn save_overwrites() {
        let slots = InMemorySlots::new();
        slots.save("alice-lastMessage", json!("hi")).unwrap();
        slots.save("alice-lastMessage", json!("hello again")).unwrap();
        assert_eq!(slots.load("alice-lastMessage").unwrap(), Some(json!("hello again")));
        assert_eq!(slots.len(), 1);
    }

    #[test]
    fn users_do_not_share_slots() {
        let slots = InMemorySlots::new();
        slots.save("alice", json!("likes ordinals")).unwrap();
        assert!(slots.load("bob").unwrap().is_none());
        assert!(slots.load("alice-lastMessage").unwrap().is_none());
    }
}
