//! Addressee classification: is the user talking to the soul?

use soulturn_core::cognition::ModelTier;
use soulturn_core::error::CognitionError;
use soulturn_core::step::ConversationStep;
use tracing::info;

use crate::context::TurnContext;
use crate::prompts::{self, NOT_SURE, SOMEONE_ELSE};

/// Who the latest message is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressee {
    Soul,
    SomeoneElse,
    Unclear,
}

/// Classify the addressee of `user`'s latest message on the quality tier.
pub async fn classify(ctx: &TurnContext, step: &ConversationStep, user: &str) -> Result<Addressee, CognitionError> {
    let soul = ctx.soul_name();
    let choices = prompts::addressee_choices(soul);
    let answer = ctx
        .computer
        .decide(
            step,
            &prompts::addressee_description(soul, user),
            &choices,
            ModelTier::Quality,
        )
        .await?;

    info!(user, target = %answer, "Addressee decided");
    if answer == choices[0] {
        Ok(Addressee::Soul)
    } else if answer == SOMEONE_ELSE {
        Ok(Addressee::SomeoneElse)
    } else if answer == NOT_SURE {
        Ok(Addressee::Unclear)
    } else {
        Err(CognitionError::InvalidChoice { answer, choices })
    }
}

/// Whether the soul should reply; an unclear addressee is a coin flip.
pub async fn is_talking_to_soul(ctx: &TurnContext, step: &ConversationStep, user: &str) -> Result<bool, CognitionError> {
    match classify(ctx, step, user).await? {
        Addressee::Soul => Ok(true),
        Addressee::SomeoneElse => Ok(false),
        Addressee::Unclear => {
            let chime_in = ctx.rng.chance(ctx.settings.chime_in_probability);
            info!(user, chime_in, "Not sure who the user is talking to");
            Ok(chime_in)
        }
    }
}
