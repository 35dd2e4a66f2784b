//! Welcome turns for users joining the server.

use soulturn_core::cognition::ModelTier;
use soulturn_core::error::CognitionError;
use soulturn_core::message::Message;
use soulturn_core::perception::Perception;
use soulturn_core::step::ConversationStep;
use tracing::info;

use crate::context::TurnContext;
use crate::prompts;

/// A platform join, or the sentinel content when running off-platform.
pub fn should_welcome(perception: &Perception, sentinel: &str) -> bool {
    let simulated = !perception.is_from_platform() && perception.content == sentinel;
    perception.is_platform_join() || simulated
}

/// Think of a welcome and append it, augmented with the must-mention facts.
pub async fn think_of_welcome(
    ctx: &TurnContext,
    step: &ConversationStep,
    user: &str,
) -> Result<ConversationStep, CognitionError> {
    info!(user, "New member joined the server");
    let soul = ctx.soul_name();

    let thought = ctx
        .computer
        .think(step, &prompts::welcome_instruction(soul, user), ModelTier::Fast)
        .await?;

    let memory = prompts::welcome_memory(soul, user, thought.trim(), &ctx.settings.welcome);
    Ok(step.with_memory(Message::assistant(memory)))
}
