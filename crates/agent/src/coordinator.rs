//! The turn coordinator.
//!
//! ```text
//! ADMIT? ─► SKIP
//!   │
//!   ├─► WELCOME ─────────────────────────────► EMIT ─► DONE
//!   │
//!   └─► CLASSIFY ┐
//!       DRAFT    ├─(join)─► ABANDON | STALE? ─► ABANDON
//!       REACT    ┘                      │
//!                                       └────► EMIT ─► DONE
//! ```

use chrono::Utc;
use soulturn_core::error::Error;
use soulturn_core::event::DomainEvent;
use soulturn_core::perception::Perception;
use soulturn_core::step::ConversationStep;
use tracing::info;

use crate::context::TurnContext;
use crate::turn::admission::{self, SkipReason};
use crate::turn::{addressee, drafting, emission, reaction, recall, welcome};

/// Why a turn was dropped after its parallel phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
    /// The user was talking to someone else
    NotAddressed,
    /// The user sent more messages while the reply was being drafted
    NewerMessages,
}

impl AbandonReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAddressed => "not_addressed",
            Self::NewerMessages => "newer_messages",
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnDisposition {
    Skipped(SkipReason),
    Abandoned(AbandonReason),
    Welcomed { parts: usize },
    Replied { parts: usize },
}

/// The step a turn hands back, and how it got there.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The input step for skipped/abandoned turns, otherwise the spoken step
    pub step: ConversationStep,
    pub disposition: TurnDisposition,
}

impl TurnOutcome {
    pub fn spoke(&self) -> bool {
        matches!(
            self.disposition,
            TurnDisposition::Welcomed { .. } | TurnDisposition::Replied { .. }
        )
    }
}

/// Runs turns against a [`TurnContext`].
pub struct TurnCoordinator {
    ctx: TurnContext,
}

impl TurnCoordinator {
    pub fn new(ctx: TurnContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &TurnContext {
        &self.ctx
    }

    /// Handle one perception. `step` is never modified.
    ///
    /// Skips and abandonments are ordinary outcomes; errors only come from
    /// the step computer, retrieval or slot storage.
    pub async fn run_turn(&self, step: &ConversationStep, perception: &Perception) -> Result<TurnOutcome, Error> {
        let ctx = &self.ctx;
        let user = perception.user_name();

        let pending = ctx.perceptions.pending();
        if let Err(reason) = admission::admit(&pending, user, ctx.settings.max_pending_perceptions) {
            info!(user, pending = pending.len(), reason = reason.as_str(), "Skipping perception");
            ctx.events.publish(DomainEvent::PerceptionSkipped {
                user: user.to_string(),
                reason: reason.as_str().to_string(),
                pending: pending.len(),
                timestamp: Utc::now(),
            });
            return Ok(self.unchanged(step, TurnDisposition::Skipped(reason)));
        }

        let remembered = recall::remember_user(ctx, step, perception);

        if welcome::should_welcome(perception, &ctx.settings.welcome_sentinel) {
            let welcomed = welcome::think_of_welcome(ctx, &remembered, user).await?;
            let spoken = emission::say_something(ctx, welcomed, perception, Some(1)).await?;
            self.completed(user, spoken.parts, true);
            return Ok(TurnOutcome {
                step: spoken.step,
                disposition: TurnDisposition::Welcomed { parts: spoken.parts },
            });
        }

        let (addressed, drafted, _) = tokio::join!(
            addressee::is_talking_to_soul(ctx, &remembered, user),
            drafting::draft_reply(ctx, &remembered, user),
            reaction::react_with_emoji(ctx, &remembered, perception),
        );

        if !addressed? {
            return Ok(self.abandon(step, user, AbandonReason::NotAddressed));
        }
        let drafted = drafted?;

        if admission::has_more_from_user(&ctx.perceptions.pending(), user) {
            return Ok(self.abandon(step, user, AbandonReason::NewerMessages));
        }

        let spoken = emission::say_something(ctx, drafted, perception, None).await?;
        self.completed(user, spoken.parts, false);
        Ok(TurnOutcome {
            step: spoken.step,
            disposition: TurnDisposition::Replied { parts: spoken.parts },
        })
    }

    fn unchanged(&self, step: &ConversationStep, disposition: TurnDisposition) -> TurnOutcome {
        TurnOutcome {
            step: step.clone(),
            disposition,
        }
    }

    fn abandon(&self, step: &ConversationStep, user: &str, reason: AbandonReason) -> TurnOutcome {
        info!(user, reason = reason.as_str(), "Abandoning turn");
        self.ctx.events.publish(DomainEvent::TurnAbandoned {
            user: user.to_string(),
            reason: reason.as_str().to_string(),
            timestamp: Utc::now(),
        });
        self.unchanged(step, TurnDisposition::Abandoned(reason))
    }

    fn completed(&self, user: &str, parts: usize, welcome: bool) {
        info!(user, parts, welcome, "Turn completed");
        self.ctx.events.publish(DomainEvent::TurnCompleted {
            user: user.to_string(),
            parts,
            welcome,
            timestamp: Utc::now(),
        });
    }
}
