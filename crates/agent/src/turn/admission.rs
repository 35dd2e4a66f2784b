//! Admission control: backlog shedding and burst detection.
//!
//! Both checks read a snapshot of the pending queue. The burst check runs
//! again after the parallel phase because the queue keeps growing meanwhile.

use soulturn_core::perception::Perception;
use tracing::debug;

/// Why a perception was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// More perceptions are pending than the ceiling allows
    PendingLimit,
    /// The same user has newer messages queued
    MessageBurst,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingLimit => "pending_limit",
            Self::MessageBurst => "message_burst",
        }
    }
}

/// True when the backlog exceeds `ceiling`.
pub fn has_reached_pending_limit(pending: &[Perception], ceiling: usize) -> bool {
    debug!(pending = pending.len(), "Total pending perceptions");
    pending.len() > ceiling
}

/// True when any pending perception comes from `user`.
pub fn has_more_from_user(pending: &[Perception], user: &str) -> bool {
    let count = pending.iter().filter(|p| p.user_name() == user).count();
    debug!(user, count, "Pending perceptions from user");
    count > 0
}

/// Decide whether a perception from `user` may be processed.
pub fn admit(pending: &[Perception], user: &str, ceiling: usize) -> Result<(), SkipReason> {
    if has_reached_pending_limit(pending, ceiling) {
        return Err(SkipReason::PendingLimit);
    }
    if has_more_from_user(pending, user) {
        return Err(SkipReason::MessageBurst);
    }
    Ok(())
}
