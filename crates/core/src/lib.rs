//! # SoulTurn Core
//!
//! Domain types, collaborator traits, and error definitions for the SoulTurn
//! turn coordinator. This crate has **no runtime dependencies beyond tokio's
//! sync primitives**: it defines the model every other crate builds on.
//!
//! ## Design Philosophy
//!
//! The coordinator talks to the outside world only through traits defined here:
//! - [`PendingPerceptions`]: snapshot of the not-yet-processed inbound queue
//! - [`StepComputer`]: the LLM-backed step computation
//! - [`DispatchSink`]: where outbound actions go
//! - [`SlotStore`]: durable key-value memory slots
//! - [`Retriever`]: context augmentation for questions that need it
//!
//! Implementations live in their respective crates, so tests can swap in
//! scripted stand-ins without touching the policy code.

pub mod cognition;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod memory;
pub mod message;
pub mod perception;
pub mod provider;
pub mod retrieval;
pub mod step;

// Re-export key types at crate root for ergonomics
pub use cognition::{
    dialog_channel, DialogSender, DialogStream, ModelTier, StepCompletion, StepComputer, StreamingProducer,
    StreamingStep,
};
pub use dispatch::{Action, ActionContent, ActionKind, ActionMetadata, DispatchSink, SendAs, SoulActionConfig};
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use memory::{EmotionalState, SlotStore};
pub use message::{Message, Role};
pub use perception::{PendingPerceptions, Perception, PerceptionQueue, PlatformEvent, PlatformEventKind};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use retrieval::{NoRetrieval, Retriever};
pub use step::ConversationStep;
