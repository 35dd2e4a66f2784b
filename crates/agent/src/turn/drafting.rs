//! Reply drafting: an internal thought answering the user.
//!
//! Whether the question needs retrieved context is judged while both
//! candidate thoughts are already being computed; the judgment only picks
//! which one to keep.

use soulturn_core::cognition::ModelTier;
use soulturn_core::error::Error;
use soulturn_core::memory::{EmotionalState, EMOTIONAL_STATE_KEY};
use soulturn_core::step::ConversationStep;
use tracing::{debug, info, warn};

use crate::context::TurnContext;
use crate::prompts;

/// Retrieve context, then think about what was just remembered.
pub async fn reply_with_context(ctx: &TurnContext, step: &ConversationStep, user: &str) -> Result<ConversationStep, Error> {
    let augmented = ctx.retriever.augment(step).await?;
    let instruction = prompts::context_reply_instruction(ctx.soul_name(), user);
    Ok(ctx
        .computer
        .next_thought(&augmented, &instruction, ModelTier::Quality)
        .await?)
}

/// Think of a reply colored by the soul's current emotion.
pub async fn simple_reply(ctx: &TurnContext, step: &ConversationStep, user: &str) -> Result<ConversationStep, Error> {
    let default = EmotionalState::new(ctx.settings.default_emotion.clone());
    let state = ctx
        .slots
        .read_or(EMOTIONAL_STATE_KEY, default.clone())
        .unwrap_or_else(|e| {
            warn!(error = %e, "Emotional state unreadable, using default");
            default
        });

    let instruction = prompts::simple_reply_instruction(ctx.soul_name(), user, &state.emotion);
    Ok(ctx
        .computer
        .next_thought(step, &instruction, ModelTier::Quality)
        .await?)
}

/// Draft the reply thought; both branches run while the context question is judged.
pub async fn draft_reply(ctx: &TurnContext, step: &ConversationStep, user: &str) -> Result<ConversationStep, Error> {
    let statement = prompts::needs_context_query(user, &ctx.settings.rag_topics);
    let (needs_context, with_context, simple) = tokio::join!(
        ctx.computer.query(step, &statement, ModelTier::Quality),
        reply_with_context(ctx, step, user),
        simple_reply(ctx, step, user),
    );

    let (chosen, discarded) = if needs_context? {
        info!(user, "Question needs additional context to be answered");
        (with_context, simple)
    } else {
        info!(user, "Question can be answered with a simple reply");
        (simple, with_context)
    };

    if let Err(e) = discarded {
        debug!(error = %e, "Discarded draft failed");
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;
    use crate::scripted::{DirectiveKind, ScriptedComputer};
    use crate::test_helpers::{conversation, Harness, SnapshotPending};
    use soulturn_core::message::Message;
    use soulturn_core::memory::SlotStore;
    use soulturn_memory::{KnowledgeDocument, KnowledgeStore};
    use std::sync::Arc;

    fn computer(needs_context: &str) -> ScriptedComputer {
        ScriptedComputer::default()
            .on(DirectiveKind::Query, &[needs_context])
            .on_matching(DirectiveKind::NextThought, "remembered", &["with context"])
            .on_matching(DirectiveKind::NextThought, "Feeling", &["simple"])
    }

    fn harness(computer: ScriptedComputer) -> Harness {
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::constant(0.0));
        let store = KnowledgeStore::new(
            vec![KnowledgeDocument::new("Ordinals", "Ordinals inscribe data on satoshis.")],
            3,
        );
        Harness {
            ctx: h.ctx.clone().with_retriever(Arc::new(store)),
            ..h
        }
    }

    #[tokio::test]
    async fn simple_branch_uses_emotion() {
        let h = harness(computer("no"));
        h.slots
            .save("emotionalState", serde_json::json!({"emotion": "grumpy"}))
            .unwrap();
        let step = conversation("alice", "how are you?");

        let drafted = draft_reply(&h.ctx, &step, "alice").await.unwrap();
        assert_eq!(drafted.last_memory().unwrap().content, "Julio thought: simple");
        assert_eq!(drafted.len(), step.len() + 1);

        let thoughts = h.computer.calls_of(DirectiveKind::NextThought);
        assert!(thoughts.iter().any(|c| c.instruction == "Feeling grumpy, Julio thinks of a response to alice."));
    }

    #[tokio::test]
    async fn default_emotion_until_written() {
        let h = harness(computer("no"));
        draft_reply(&h.ctx, &conversation("alice", "yo"), "alice").await.unwrap();
        let thoughts = h.computer.calls_of(DirectiveKind::NextThought);
        assert!(thoughts.iter().any(|c| c.instruction.starts_with("Feeling happy")));
    }

    #[tokio::test]
    async fn context_branch_sees_retrieved_memory() {
        let h = harness(computer("yes"));
        let step = conversation("alice", "what are ordinals?");

        let drafted = draft_reply(&h.ctx, &step, "alice").await.unwrap();
        let memories = drafted.memories();
        assert_eq!(memories.len(), 3);
        assert!(memories[1].content.starts_with("Julio remembers:"));
        assert_eq!(memories[2].content, "Julio thought: with context");
    }

    #[tokio::test]
    async fn both_branches_start_regardless_of_judgment() {
        let h = harness(computer("no"));
        draft_reply(&h.ctx, &conversation("alice", "ordinals?"), "alice").await.unwrap();
        let thoughts = h.computer.calls_of(DirectiveKind::NextThought);
        assert_eq!(thoughts.len(), 2);
        assert!(thoughts.iter().all(|c| c.tier == ModelTier::Quality));

        let query = &h.computer.calls_of(DirectiveKind::Query)[0];
        assert_eq!(query.tier, ModelTier::Quality);
        assert!(query.instruction.starts_with("alice has asked a question about Julio"));
    }

    #[tokio::test]
    async fn discarded_branch_failure_is_ignored() {
        let computer = ScriptedComputer::default()
            .on(DirectiveKind::Query, &["no"])
            .failing(DirectiveKind::NextThought, "remembered", "vector store down")
            .on(DirectiveKind::NextThought, &["simple"]);
        let h = harness(computer);

        let drafted = draft_reply(&h.ctx, &conversation("alice", "gm"), "alice").await.unwrap();
        assert_eq!(drafted.last_memory().unwrap().content, "Julio thought: simple");
    }

    #[tokio::test]
    async fn chosen_branch_failure_propagates() {
        let computer = ScriptedComputer::default()
            .on(DirectiveKind::Query, &["yes"])
            .failing(DirectiveKind::NextThought, "remembered", "vector store down")
            .on(DirectiveKind::NextThought, &["simple"]);
        let h = harness(computer);

        let result = draft_reply(&h.ctx, &conversation("alice", "gm"), "alice").await;
        assert!(matches!(result, Err(Error::Cognition(_))));
    }

    #[tokio::test]
    async fn input_step_is_untouched() {
        let h = harness(computer("yes"));
        let step = conversation("alice", "ordinals?").with_memory(Message::assistant("earlier"));
        let before = step.memories();
        draft_reply(&h.ctx, &step, "alice").await.unwrap();
        assert_eq!(step.memories(), before);
    }
}
