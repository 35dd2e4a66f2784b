//! Retrieval trait: context augmentation for questions that need facts.
//!
//! A retriever looks at a step (usually its latest user message), finds
//! relevant material in some knowledge source, and returns a new step with
//! that material appended as a memory. Finding nothing is not an error:
//! the step is returned unchanged.

use async_trait::async_trait;

use crate::error::RetrievalError;
use crate::step::ConversationStep;

#[async_trait]
pub trait Retriever: Send + Sync {
    /// The retriever name (e.g., "knowledge", "none").
    fn name(&self) -> &str;

    /// Append retrieved material to `step`.
    async fn augment(&self, step: &ConversationStep) -> Result<ConversationStep, RetrievalError>;
}

/// A retriever that never finds anything.
pub struct NoRetrieval;

#[async_trait]
impl Retriever for NoRetrieval {
    fn name(&self) -> &str {
        "none"
    }

    async fn augment(&self, step: &ConversationStep) -> Result<ConversationStep, RetrievalError> {
        Ok(step.clone())
    }
}
