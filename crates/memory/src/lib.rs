//! Memory slot and knowledge implementations for SoulTurn.

pub mod file_backend;
pub mod in_memory;
pub mod knowledge;
pub mod noop;

pub use file_backend::FileSlots;
pub use in_memory::InMemorySlots;
pub use knowledge::{KnowledgeDocument, KnowledgeStore};
pub use noop::NoopSlots;
