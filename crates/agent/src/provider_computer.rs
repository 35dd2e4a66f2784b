//! Step computation over an LLM [`Provider`].
//!
//! Each directive becomes one chat request: a system message framing the
//! soul, the step's memories, and the directive itself as the final user
//! message. Answers are parsed into the shape the directive asks for.

use std::sync::Arc;

use async_trait::async_trait;
use soulturn_config::ModelsConfig;
use soulturn_core::cognition::{ModelTier, StepComputer, StreamingStep};
use soulturn_core::error::CognitionError;
use soulturn_core::message::Message;
use soulturn_core::provider::{Provider, ProviderRequest};
use soulturn_core::step::ConversationStep;
use tracing::{debug, warn};

pub struct ProviderComputer {
    provider: Arc<dyn Provider>,
    fast_model: String,
    quality_model: String,
    temperature: f32,
}

impl ProviderComputer {
    pub fn new(provider: Arc<dyn Provider>, models: &ModelsConfig) -> Self {
        Self {
            provider,
            fast_model: models.fast.clone(),
            quality_model: models.quality.clone(),
            temperature: models.temperature,
        }
    }

    fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Quality => &self.quality_model,
        }
    }

    fn request(&self, step: &ConversationStep, directive: String, tier: ModelTier, stream: bool) -> ProviderRequest {
        let soul = step.soul_name();
        let mut messages = vec![Message::system(format!(
            "You are modeling the mind of {soul}. Stay in character and follow each directive exactly."
        ))];
        messages.extend(step.memories());
        messages.push(Message::user(directive));

        ProviderRequest {
            model: self.model(tier).to_string(),
            messages,
            temperature: self.temperature,
            max_tokens: None,
            stream,
        }
    }

    async fn complete(&self, step: &ConversationStep, directive: String, tier: ModelTier) -> Result<String, CognitionError> {
        let request = self.request(step, directive, tier, false);
        debug!(provider = self.provider.name(), model = %request.model, "Computing step");
        let response = self.provider.complete(request).await?;
        Ok(response.message.content.trim().to_string())
    }
}

/// Match a free-text answer against the offered choices.
///
/// Exact (case-insensitive, ignoring quotes and trailing punctuation) wins;
/// otherwise the first choice mentioned in the answer.
pub fn parse_choice(answer: &str, choices: &[String]) -> Option<String> {
    let cleaned = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '!')
        .to_lowercase();
    choices
        .iter()
        .find(|choice| choice.to_lowercase() == cleaned)
        .or_else(|| {
            choices
                .iter()
                .find(|choice| cleaned.contains(&choice.to_lowercase()))
        })
        .cloned()
}

/// A leading yes/no; anything else counts as no.
pub fn parse_yes_no(answer: &str) -> bool {
    answer
        .trim_start()
        .to_lowercase()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .starts_with("yes")
}

#[async_trait]
impl StepComputer for ProviderComputer {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn decide(
        &self,
        step: &ConversationStep,
        description: &str,
        choices: &[String],
        tier: ModelTier,
    ) -> Result<String, CognitionError> {
        let directive = format!(
            "{description}\n\nAnswer with exactly one of: {}.",
            choices.join(", ")
        );
        let answer = self.complete(step, directive, tier).await?;
        parse_choice(&answer, choices).ok_or_else(|| CognitionError::InvalidChoice {
            answer,
            choices: choices.to_vec(),
        })
    }

    async fn query(&self, step: &ConversationStep, statement: &str, tier: ModelTier) -> Result<bool, CognitionError> {
        let directive = format!(
            "Is the following statement true? Answer yes or no.\n\nStatement: {statement}"
        );
        let answer = self.complete(step, directive, tier).await?;
        Ok(parse_yes_no(&answer))
    }

    async fn think(&self, step: &ConversationStep, instruction: &str, tier: ModelTier) -> Result<String, CognitionError> {
        let directive = format!(
            "{instruction}\n\nReply with {}'s inner monologue only, in one or two sentences.",
            step.soul_name()
        );
        self.complete(step, directive, tier).await
    }

    async fn next_thought(
        &self,
        step: &ConversationStep,
        instruction: &str,
        tier: ModelTier,
    ) -> Result<ConversationStep, CognitionError> {
        let thought = self.think(step, instruction, tier).await?;
        Ok(step.with_memory(Message::assistant(format!(
            "{} thought: {thought}",
            step.soul_name()
        ))))
    }

    async fn stream_dialog(
        &self,
        step: &ConversationStep,
        instruction: &str,
        tier: ModelTier,
    ) -> Result<StreamingStep, CognitionError> {
        let soul = step.soul_name().to_string();
        let directive = format!("{instruction}\n\nReply with exactly what {soul} says out loud, nothing else.");
        let request = self.request(step, directive, tier, true);
        let mut chunks = self.provider.stream(request).await?;

        let (producer, streaming) = StreamingStep::channel();
        let step = step.clone();
        tokio::spawn(async move {
            let mut said = String::new();
            while let Some(chunk) = chunks.recv().await {
                match chunk {
                    Ok(chunk) => {
                        if let Some(content) = chunk.content {
                            said.push_str(&content);
                            producer.send_chunk(content);
                        }
                        if chunk.done {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Dialog stream failed");
                        producer.finish(Err(e.into()));
                        return;
                    }
                }
            }
            let said = said.trim();
            producer.finish(Ok(step.with_memory(Message::assistant(format!("{soul} said: {said}")))));
        });

        Ok(streaming)
    }

    async fn emoji(&self, step: &ConversationStep, tier: ModelTier) -> Result<String, CognitionError> {
        let directive = format!(
            "Pick the single emoji {} would react with to the last message. Reply with the emoji only.",
            step.soul_name()
        );
        let answer = self.complete(step, directive, tier).await?;
        answer
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| CognitionError::ComputationFailed("empty emoji answer".into()))
    }
}
