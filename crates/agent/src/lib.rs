//! The turn coordinator: the heart of SoulTurn.
//!
//! One turn handles one inbound perception:
//!
//! 1. **Admit**: skip if the backlog is too deep or the same user has more
//!    messages queued
//! 2. **Recall** what is remembered about the user
//! 3. **Classify**: a join gets a welcome thought; anything else fans out
//!    into addressee detection, reply drafting and an optional reaction
//! 4. **Re-check** staleness after the parallel phase
//! 5. **Emit** the reply as one or more streamed parts, then remember it
//!
//! Every step is an immutable [`ConversationStep`](soulturn_core::ConversationStep);
//! a skipped or abandoned turn hands back the step it was given.

pub mod context;
pub mod coordinator;
pub mod prompts;
pub mod provider_computer;
pub mod random;
pub mod runtime;
pub mod scripted;
pub mod sinks;
pub mod turn;

#[cfg(test)]
mod test_helpers;

pub use context::{build_retriever, build_slot_store, TurnContext, TurnSettings, WelcomeSettings};
pub use coordinator::{AbandonReason, TurnCoordinator, TurnDisposition, TurnOutcome};
pub use provider_computer::ProviderComputer;
pub use random::{FixedRandom, RandomSource, SeededRandom, ThreadRandom};
pub use runtime::SoulRuntime;
pub use scripted::{DirectiveKind, ScriptRule, ScriptedCall, ScriptedComputer};
pub use sinks::{RecordedAction, RecordingSink, TracingSink};
pub use turn::admission::SkipReason;
