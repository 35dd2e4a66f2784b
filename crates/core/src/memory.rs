//! Durable memory slots: small key-value entries that outlive a turn.
//!
//! The turn policy uses three kinds of slot:
//! - `<user>`: free-text profile summary of a user
//! - `<user>-lastMessage`: text of the last message sent to that user
//! - `emotionalState`: the soul's current [`EmotionalState`]
//!
//! A slot holds its default until first written. Reads and writes are
//! synchronous: they happen locally within a turn.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Key of the emotional-state slot.
pub const EMOTIONAL_STATE_KEY: &str = "emotionalState";

/// Key of a user's profile slot.
pub fn profile_key(user_name: &str) -> String {
    user_name.to_string()
}

/// Key of the slot holding the last message sent to a user.
pub fn last_message_key(user_name: &str) -> String {
    format!("{user_name}-lastMessage")
}

/// The soul's current named emotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub emotion: String,
}

impl EmotionalState {
    pub fn new(emotion: impl Into<String>) -> Self {
        Self {
            emotion: emotion.into(),
        }
    }
}

/// The slot storage trait.
///
/// Implementations: in-memory (testing), JSON file, none (no-op).
pub trait SlotStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "file", "none").
    fn name(&self) -> &str;

    /// Read a slot. `None` means it was never written.
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, MemoryError>;

    /// Overwrite a slot.
    fn save(&self, key: &str, value: serde_json::Value) -> Result<(), MemoryError>;
}

impl dyn SlotStore {
    /// Read a typed slot, falling back to `default` if unset.
    pub fn read_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, MemoryError> {
        match self.load(key)? {
            Some(value) => serde_json::from_value(value).map_err(|e| MemoryError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    /// Overwrite a typed slot.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), MemoryError> {
        let value = serde_json::to_value(value).map_err(|e| MemoryError::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.save(key, value)
    }
}
