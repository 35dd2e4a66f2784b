//! User memory recall.

use soulturn_core::memory::{last_message_key, profile_key};
use soulturn_core::message::Message;
use soulturn_core::perception::Perception;
use soulturn_core::step::ConversationStep;
use tracing::{debug, warn};

use crate::context::TurnContext;
use crate::prompts;

/// Default profile for a user nobody has written about yet.
pub fn default_profile(perception: &Perception) -> String {
    perception
        .event
        .as_ref()
        .and_then(|event| event.user_display_name.as_deref())
        .map(|display| format!("- Display name: \"{display}\""))
        .unwrap_or_default()
}

fn read_text(ctx: &TurnContext, key: &str, default: String) -> String {
    match ctx.slots.read_or(key, default.clone()) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Slot unreadable, treating as empty");
            default
        }
    }
}

/// Append what is remembered about the perception's user, if anything.
///
/// Never fails: missing or unreadable slots simply mean nothing is recalled.
pub fn remember_user(ctx: &TurnContext, step: &ConversationStep, perception: &Perception) -> ConversationStep {
    let user = perception.user_name();
    let soul = ctx.soul_name();

    let profile = read_text(ctx, &profile_key(user), default_profile(perception));
    let last_message = read_text(ctx, &last_message_key(user), String::new());

    match prompts::recollection(soul, user, &profile, &last_message) {
        Some(remembered) => {
            debug!(user, "Recalled memories about user");
            step.with_memory(Message::assistant(remembered))
        }
        None => {
            debug!(user, "No memories involving user");
            step.clone()
        }
    }
}
