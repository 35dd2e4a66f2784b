//! A sequential soul runtime.
//!
//! Producers push perceptions onto a shared [`PerceptionQueue`]; the runtime
//! pops them one at a time, records each as a user memory, runs a turn and
//! carries the resulting step into the next turn. While a turn runs, the
//! perceptions still in the queue are its pending set.

use std::sync::Arc;

use soulturn_core::error::Error;
use soulturn_core::message::Message;
use soulturn_core::perception::{Perception, PerceptionQueue};
use soulturn_core::step::ConversationStep;
use tracing::{debug, warn};

use crate::context::TurnContext;
use crate::coordinator::{TurnCoordinator, TurnOutcome};

pub struct SoulRuntime {
    queue: PerceptionQueue,
    coordinator: TurnCoordinator,
    step: ConversationStep,
}

impl SoulRuntime {
    /// Create a runtime over `queue`. The context's perception source is
    /// replaced by the queue itself.
    pub fn new(queue: PerceptionQueue, mut ctx: TurnContext) -> Self {
        ctx.perceptions = Arc::new(queue.clone());
        let step = ConversationStep::new(ctx.soul_name());
        Self {
            queue,
            coordinator: TurnCoordinator::new(ctx),
            step,
        }
    }

    /// Start from an existing step instead of an empty one.
    pub fn with_step(mut self, step: ConversationStep) -> Self {
        self.step = step;
        self
    }

    pub fn queue(&self) -> &PerceptionQueue {
        &self.queue
    }

    /// The step carried between turns.
    pub fn step(&self) -> &ConversationStep {
        &self.step
    }

    pub fn coordinator(&self) -> &TurnCoordinator {
        &self.coordinator
    }

    /// Run a turn for the oldest queued perception, if any.
    ///
    /// On error the carried step is left as it was before the turn.
    pub async fn process_next(&mut self) -> Option<(Perception, Result<TurnOutcome, Error>)> {
        let perception = self.queue.pop()?;
        debug!(user = perception.user_name(), remaining = self.queue.len(), "Processing perception");

        let perceived = self.step.with_memory(perceived_memory(&perception));
        let result = self.coordinator.run_turn(&perceived, &perception).await;
        match &result {
            Ok(outcome) => self.step = outcome.step.clone(),
            Err(e) => warn!(user = perception.user_name(), error = %e, "Turn failed"),
        }
        Some((perception, result))
    }

    /// Process perceptions until the queue is empty.
    pub async fn drain(&mut self) -> Vec<(Perception, Result<TurnOutcome, Error>)> {
        let mut results = Vec::new();
        while let Some(result) = self.process_next().await {
            results.push(result);
        }
        results
    }
}

/// A perception as the user memory it becomes.
fn perceived_memory(perception: &Perception) -> Message {
    Message::user(perception.content.clone()).named(perception.user_name())
}
