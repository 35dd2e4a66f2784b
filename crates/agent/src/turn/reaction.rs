//! Optional emoji reaction.

use chrono::Utc;
use soulturn_core::cognition::ModelTier;
use soulturn_core::dispatch::Action;
use soulturn_core::event::DomainEvent;
use soulturn_core::perception::Perception;
use soulturn_core::step::ConversationStep;
use tracing::{debug, info, warn};

use crate::context::TurnContext;

/// Maybe react to the perception. Never fails the turn.
///
/// Returns the emoji when one was dispatched.
pub async fn react_with_emoji(ctx: &TurnContext, step: &ConversationStep, perception: &Perception) -> Option<String> {
    if !ctx.rng.chance(ctx.settings.reaction_probability) {
        debug!("Skipping emoji reaction");
        return None;
    }

    let user = perception.user_name();
    let emoji = match ctx.computer.emoji(step, ModelTier::Fast).await {
        Ok(emoji) => emoji.trim().to_string(),
        Err(e) => {
            warn!(user, error = %e, "Emoji reaction failed");
            return None;
        }
    };

    info!(user, emoji = %emoji, "Reacting with emoji");
    ctx.sink.dispatch(Action::reacts(emoji.clone(), perception.event.clone()));
    ctx.events.publish(DomainEvent::ReactionDispatched {
        user: user.to_string(),
        emoji: emoji.clone(),
        timestamp: Utc::now(),
    });
    Some(emoji)
}
