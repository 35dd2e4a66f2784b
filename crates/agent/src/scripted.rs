//! Scripted step computation: deterministic answers for replays and tests.
//!
//! A [`ScriptedComputer`] answers each directive from a list of rules. A rule
//! names the directive kind, optionally a substring the instruction must
//! contain, and a list of responses consumed in order (the last one repeats).
//! The first matching rule wins. Every call is recorded.
//!
//! Rules deserialize from TOML:
//!
//! ```toml
//! [[script]]
//! kind = "decide"
//! responses = ["julio"]
//!
//! [[script]]
//! kind = "next_thought"
//! matches = "thinks of a response"
//! responses = ["gm alice, great to see you"]
//! ```

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use soulturn_core::cognition::{ModelTier, StepComputer, StreamingStep};
use soulturn_core::error::CognitionError;
use soulturn_core::message::Message;
use soulturn_core::step::ConversationStep;
use tracing::debug;

/// Which step computation a rule answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    Decide,
    Query,
    Think,
    NextThought,
    Dialog,
    Emoji,
}

impl DirectiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decide => "decide",
            Self::Query => "query",
            Self::Think => "think",
            Self::NextThought => "next_thought",
            Self::Dialog => "dialog",
            Self::Emoji => "emoji",
        }
    }
}

/// One scripted answer source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRule {
    pub kind: DirectiveKind,

    /// Only answer instructions containing this text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,

    /// Answers in order; the last one repeats
    #[serde(default)]
    pub responses: Vec<String>,

    /// Fail every matching call with this message instead of answering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScriptRule {
    fn applies(&self, kind: DirectiveKind, instruction: &str) -> bool {
        self.kind == kind
            && self
                .matches
                .as_deref()
                .is_none_or(|needle| instruction.contains(needle))
    }
}

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCall {
    pub kind: DirectiveKind,
    pub instruction: String,
    pub tier: ModelTier,
}

pub struct ScriptedComputer {
    rules: Vec<ScriptRule>,
    cursors: Mutex<Vec<usize>>,
    calls: Mutex<Vec<ScriptedCall>>,
}

impl ScriptedComputer {
    pub fn new(rules: Vec<ScriptRule>) -> Self {
        let cursors = vec![0; rules.len()];
        Self {
            rules,
            cursors: Mutex::new(cursors),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every `kind` directive with `responses`.
    pub fn on(self, kind: DirectiveKind, responses: &[&str]) -> Self {
        self.rule(kind, None, responses, None)
    }

    /// Answer `kind` directives whose instruction contains `matches`.
    pub fn on_matching(self, kind: DirectiveKind, matches: &str, responses: &[&str]) -> Self {
        self.rule(kind, Some(matches), responses, None)
    }

    /// Fail `kind` directives whose instruction contains `matches`.
    pub fn failing(self, kind: DirectiveKind, matches: &str, error: &str) -> Self {
        self.rule(kind, Some(matches), &[], Some(error))
    }

    fn rule(
        mut self,
        kind: DirectiveKind,
        matches: Option<&str>,
        responses: &[&str],
        error: Option<&str>,
    ) -> Self {
        self.rules.push(ScriptRule {
            kind,
            matches: matches.map(str::to_string),
            responses: responses.iter().map(|r| r.to_string()).collect(),
            error: error.map(str::to_string),
        });
        self.cursors
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(0);
        self
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<ScriptedCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Calls of one kind, in order.
    pub fn calls_of(&self, kind: DirectiveKind) -> Vec<ScriptedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind == kind)
            .collect()
    }

    fn answer(
        &self,
        kind: DirectiveKind,
        instruction: &str,
        tier: ModelTier,
    ) -> Result<String, CognitionError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ScriptedCall {
                kind,
                instruction: instruction.to_string(),
                tier,
            });

        let exhausted = || CognitionError::ScriptExhausted {
            kind: kind.as_str().to_string(),
            instruction: instruction.to_string(),
        };

        let index = self
            .rules
            .iter()
            .position(|rule| rule.applies(kind, instruction))
            .ok_or_else(exhausted)?;
        let rule = &self.rules[index];

        if let Some(error) = &rule.error {
            return Err(CognitionError::ComputationFailed(error.clone()));
        }

        let mut cursors = self.cursors.lock().unwrap_or_else(PoisonError::into_inner);
        let cursor = cursors[index];
        let response = rule
            .responses
            .get(cursor)
            .or_else(|| rule.responses.last())
            .cloned()
            .ok_or_else(exhausted)?;
        cursors[index] = cursor + 1;

        debug!(kind = kind.as_str(), response = %response, "Scripted answer");
        Ok(response)
    }
}

impl Default for ScriptedComputer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

fn parse_yes_no(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer.starts_with("yes") || answer.starts_with("true")
}

#[async_trait]
impl StepComputer for ScriptedComputer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(
        &self,
        _step: &ConversationStep,
        description: &str,
        choices: &[String],
        tier: ModelTier,
    ) -> Result<String, CognitionError> {
        let answer = self.answer(DirectiveKind::Decide, description, tier)?;
        choices
            .iter()
            .find(|choice| choice.eq_ignore_ascii_case(answer.trim()))
            .cloned()
            .ok_or_else(|| CognitionError::InvalidChoice {
                answer,
                choices: choices.to_vec(),
            })
    }

    async fn query(&self, _step: &ConversationStep, statement: &str, tier: ModelTier) -> Result<bool, CognitionError> {
        let answer = self.answer(DirectiveKind::Query, statement, tier)?;
        Ok(parse_yes_no(&answer))
    }

    async fn think(&self, _step: &ConversationStep, instruction: &str, tier: ModelTier) -> Result<String, CognitionError> {
        self.answer(DirectiveKind::Think, instruction, tier)
    }

    async fn next_thought(
        &self,
        step: &ConversationStep,
        instruction: &str,
        tier: ModelTier,
    ) -> Result<ConversationStep, CognitionError> {
        let thought = self.answer(DirectiveKind::NextThought, instruction, tier)?;
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
        let text = self.answer(DirectiveKind::Dialog, instruction, tier)?;
        let (producer, streaming) = StreamingStep::channel();

        // Word-sized chunks so consumers see genuinely partial content
        let mut first = true;
        for word in text.split(' ') {
            let chunk = if first { word.to_string() } else { format!(" {word}") };
            first = false;
            producer.send_chunk(chunk);
        }

        let next = step.with_memory(Message::assistant(format!(
            "{} said: {text}",
            step.soul_name()
        )));
        producer.finish(Ok(next));
        Ok(streaming)
    }

    async fn emoji(&self, _step: &ConversationStep, tier: ModelTier) -> Result<String, CognitionError> {
        self.answer(DirectiveKind::Emoji, "", tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> ConversationStep {
        ConversationStep::new("Julio").with_memory(Message::user("hello").named("alice"))
    }

    #[tokio::test]
    async fn responses_consumed_in_order_last_repeats() {
        let computer = ScriptedComputer::default().on(DirectiveKind::Think, &["one", "two"]);
        let s = step();
        assert_eq!(computer.think(&s, "x", ModelTier::Fast).await.unwrap(), "one");
        assert_eq!(computer.think(&s, "x", ModelTier::Fast).await.unwrap(), "two");
        assert_eq!(computer.think(&s, "x", ModelTier::Fast).await.unwrap(), "two");
    }

    #[tokio::test]
    async fn matching_rule_takes_precedence_in_order() {
        let computer = ScriptedComputer::default()
            .on_matching(DirectiveKind::Query, "said everything", &["yes"])
            .on(DirectiveKind::Query, &["no"]);
        let s = step();
        assert!(computer.query(&s, "Julio said everything he just thought.", ModelTier::Quality).await.unwrap());
        assert!(!computer.query(&s, "alice has asked a question", ModelTier::Quality).await.unwrap());
    }

    #[tokio::test]
    async fn missing_rule_is_exhausted() {
        let computer = ScriptedComputer::default();
        let err = computer.emoji(&step(), ModelTier::Fast).await.unwrap_err();
        assert!(matches!(err, CognitionError::ScriptExhausted { .. }));
    }

    #[tokio::test]
    async fn failing_rule_errors() {
        let computer = ScriptedComputer::default().failing(DirectiveKind::Think, "welcome", "boom");
        let err = computer.think(&step(), "a welcome", ModelTier::Fast).await.unwrap_err();
        assert!(matches!(err, CognitionError::ComputationFailed(m) if m == "boom"));
    }

    #[tokio::test]
    async fn decide_validates_choices() {
        let computer = ScriptedComputer::default().on(DirectiveKind::Decide, &["Julio", "pizza"]);
        let choices = vec!["julio".to_string(), "someone else".to_string()];
        let s = step();
        assert_eq!(
            computer.decide(&s, "who?", &choices, ModelTier::Quality).await.unwrap(),
            "julio"
        );
        let err = computer.decide(&s, "who?", &choices, ModelTier::Quality).await.unwrap_err();
        assert!(matches!(err, CognitionError::InvalidChoice { .. }));
    }

    #[tokio::test]
    async fn next_thought_appends_without_touching_input() {
        let computer = ScriptedComputer::default().on(DirectiveKind::NextThought, &["hmm"]);
        let s = step();
        let next = computer.next_thought(&s, "think", ModelTier::Quality).await.unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(next.len(), 2);
        assert_eq!(next.last_memory().unwrap().content, "Julio thought: hmm");
    }

    #[tokio::test]
    async fn dialog_streams_and_completes() {
        let computer = ScriptedComputer::default().on(DirectiveKind::Dialog, &["gm alice, how are you"]);
        let s = step();
        let streaming = computer.stream_dialog(&s, "speak", ModelTier::Quality).await.unwrap();
        let (stream, completion) = streaming.into_parts();
        assert_eq!(stream.collect_text().await, "gm alice, how are you");
        let next = completion.wait().await.unwrap();
        assert_eq!(next.last_memory().unwrap().content, "Julio said: gm alice, how are you");
        assert!(next.extends(&s));
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let computer = ScriptedComputer::default()
            .on(DirectiveKind::Emoji, &["🔥"])
            .on(DirectiveKind::Think, &["t"]);
        let s = step();
        computer.emoji(&s, ModelTier::Fast).await.unwrap();
        computer.think(&s, "welcome bob", ModelTier::Fast).await.unwrap();

        let calls = computer.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].instruction, "welcome bob");
        assert_eq!(computer.calls_of(DirectiveKind::Emoji).len(), 1);
    }

    #[test]
    fn rules_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Session {
            script: Vec<ScriptRule>,
        }
        let session: Session = toml::from_str(
            r#"
[[script]]
kind = "next_thought"
matches = "response"
responses = ["a", "b"]

[[script]]
kind = "emoji"
error = "no emoji today"
"#,
        )
        .unwrap();
        assert_eq!(session.script.len(), 2);
        assert_eq!(session.script[0].kind, DirectiveKind::NextThought);
        assert_eq!(session.script[1].error.as_deref(), Some("no emoji today"));
    }
}
