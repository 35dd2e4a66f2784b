//! No-op slot store: disables durable memory entirely.

use soulturn_core::error::MemoryError;
use soulturn_core::memory::SlotStore;

/// A slot store that remembers nothing: every slot stays at its default.
pub struct NoopSlots;

impl SlotStore for NoopSlots {
    fn name(&self) -> &str {
        "none"
    }

    fn load(&self, _key: &str) -> Result<Option<serde_json::Value>, MemoryError> {
        Ok(None)
    }

    fn save(&self, _key: &str, _value: serde_json::Value) -> Result<(), MemoryError> {
        Ok(())
    }
}
