//! Reply emission: the drafted thought spoken as streamed parts.
//!
//! The number of parts follows from the thought's length. Parts are spoken
//! one after another, each dispatched as a live stream before it finishes.
//! Between parts the soul is asked whether it already said everything, and
//! stops early if so. What was said is remembered as the user's last message.

use chrono::Utc;
use soulturn_core::cognition::ModelTier;
use soulturn_core::dispatch::{Action, SendAs};
use soulturn_core::error::Error;
use soulturn_core::event::DomainEvent;
use soulturn_core::memory::last_message_key;
use soulturn_core::perception::Perception;
use soulturn_core::step::ConversationStep;
use tracing::info;

use crate::context::{TurnContext, TurnSettings};
use crate::prompts;

/// Parts for a thought of `thought_words` words (average length if unknown).
///
/// `ceil(words × ratio / avg)`, clamped to `1..=max_message_parts`.
pub fn planned_parts(thought_words: Option<usize>, settings: &TurnSettings) -> usize {
    let avg = settings.avg_words_per_message.max(1);
    let words = thought_words.unwrap_or(avg) as f64;
    let target = words * settings.thought_to_speech_ratio;
    let parts = (target / avg as f64).ceil() as usize;
    parts.clamp(1, settings.max_message_parts.max(1))
}

/// Word ceiling for one part: `avg + floor(r × 2 × jitter) − jitter`.
///
/// With the defaults that is 40 plus a jitter in `[-20, +19]`.
pub fn part_word_ceiling(r: f64, settings: &TurnSettings) -> usize {
    let avg = settings.avg_words_per_message as i64;
    let jitter = settings.word_jitter as i64;
    let offset = (r * (2 * jitter) as f64).floor() as i64 - jitter;
    (avg + offset).max(1) as usize
}

/// Drop a leading role label such as `Julio said:`.
///
/// Keeps the segment between the first and second colon, so content that
/// itself contains a colon is truncated there. Content without any colon is
/// kept whole.
pub fn strip_role_label(content: &str) -> String {
    content
        .split(':')
        .nth(1)
        .unwrap_or(content)
        .trim()
        .to_string()
}

/// Words in a memory's text once its role label is dropped.
///
/// Counts segments between single spaces, so `Julio thought: a b` is 2.
/// Content without a colon is counted whole.
pub fn thought_word_count(content: &str) -> usize {
    let body = content.split_once(':').map_or(content, |(_, rest)| rest);
    body.trim().split(' ').count()
}

/// Outcome of speaking.
#[derive(Debug, Clone)]
pub struct Spoken {
    pub step: ConversationStep,
    /// Parts actually dispatched
    pub parts: usize,
    /// Label-stripped parts, each followed by a newline
    pub full_message: String,
}

/// Speak the latest thought in up to `max_parts` parts (the configured cap if `None`).
pub async fn say_something(
    ctx: &TurnContext,
    step: ConversationStep,
    perception: &Perception,
    max_parts: Option<usize>,
) -> Result<Spoken, Error> {
    let settings = ctx.settings.as_ref();
    let soul = ctx.soul_name();
    let user = perception.user_name();

    let thought_words = step.last_memory().map(|m| thought_word_count(&m.content));
    let mut total = planned_parts(thought_words, settings);
    if let Some(cap) = max_parts {
        total = total.min(cap.max(1));
    }

    let mut step = step;
    let mut full_message = String::new();
    let mut spoken = 0;

    for part in 1..=total {
        let max_words = part_word_ceiling(ctx.rng.next_f64(), settings);
        info!(user, part, total, max_words, "Speaking message part");

        let instruction = prompts::speak_part_instruction(soul, part, total, max_words);
        let (stream, completion) = ctx
            .computer
            .stream_dialog(&step, &instruction, ModelTier::Quality)
            .await?
            .into_parts();

        let send_as = if part == 1 { SendAs::Reply } else { SendAs::Message };
        ctx.sink
            .dispatch(Action::says(stream, send_as, perception.event.clone()));
        ctx.events.publish(DomainEvent::MessagePartDispatched {
            user: user.to_string(),
            part,
            total,
            max_words,
            timestamp: Utc::now(),
        });
        spoken = part;

        step = completion.wait().await?;
        if let Some(said) = step.last_memory() {
            full_message.push_str(&strip_role_label(&said.content));
        }
        full_message.push('\n');

        if part < total {
            let finished = ctx
                .computer
                .query(&step, &prompts::finished_query(soul), ModelTier::Quality)
                .await?;
            if finished {
                info!(user, part, total, "Already finished the train of thought");
                break;
            }
        }
    }

    ctx.slots.write(&last_message_key(user), &full_message)?;

    Ok(Spoken {
        step,
        parts: spoken,
        full_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::FixedRandom;
    use crate::scripted::{DirectiveKind, ScriptedComputer};
    use crate::test_helpers::{conversation, thought_of, Harness, SnapshotPending};
    use soulturn_core::error::CognitionError;
    use soulturn_core::message::Message;

    fn settings() -> TurnSettings {
        TurnSettings::default()
    }

    #[test]
    fn parts_follow_thought_length() {
        let s = settings();
        for words in 1..=200usize {
            let expected = ((words as f64 * 1.2 / 40.0).ceil() as usize).clamp(1, 3);
            assert_eq!(planned_parts(Some(words), &s), expected, "words {words}");
        }
        assert_eq!(planned_parts(Some(30), &s), 1);
        assert_eq!(planned_parts(Some(34), &s), 2);
        assert_eq!(planned_parts(Some(100), &s), 3);
        assert_eq!(planned_parts(Some(0), &s), 1);
    }

    #[test]
    fn missing_thought_uses_average() {
        // 40 × 1.2 / 40 → 2 parts
        assert_eq!(planned_parts(None, &settings()), 2);
    }

    #[test]
    fn word_ceiling_range() {
        let s = settings();
        assert_eq!(part_word_ceiling(0.0, &s), 20);
        assert_eq!(part_word_ceiling(0.5, &s), 40);
        assert_eq!(part_word_ceiling(0.999_999, &s), 59);
        for i in 0..1000 {
            let ceiling = part_word_ceiling(i as f64 / 1000.0, &s);
            assert!((20..=59).contains(&ceiling));
        }
    }

    #[test]
    fn role_label_stripping() {
        assert_eq!(strip_role_label("Julio said: gm alice"), "gm alice");
        assert_eq!(strip_role_label("  no label here "), "no label here");
        // Only the segment before a second colon survives
        assert_eq!(strip_role_label("Julio said: note: bring snacks"), "note");
    }

    #[test]
    fn thought_words_exclude_role_label() {
        assert_eq!(thought_word_count("Julio thought: one two three"), 3);
        assert_eq!(thought_word_count("one two three"), 3);
        // Colons after the label stay part of the body
        assert_eq!(thought_word_count("Julio thought: note: bring snacks"), 3);
        // Double spaces produce an empty segment, which still counts
        assert_eq!(thought_word_count("Julio thought: one  two"), 3);
        assert_eq!(thought_word_count(""), 1);
    }

    #[tokio::test]
    async fn thirty_three_word_thought_is_one_part() {
        let computer = ScriptedComputer::default()
            .on(DirectiveKind::Dialog, &["gm alice"])
            .on(DirectiveKind::Query, &["no"]);
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::constant(0.5));

        // 33 × 1.2 / 40 = 0.99
        let spoken = say_something(&h.ctx, thought_step(33), &Perception::said("alice", "hello"), None)
            .await
            .unwrap();
        assert_eq!(spoken.parts, 1);

        // 34 × 1.2 / 40 = 1.02
        let spoken = say_something(&h.ctx, thought_step(34), &Perception::said("alice", "hello"), None)
            .await
            .unwrap();
        assert_eq!(spoken.parts, 2);
    }

    fn thought_step(words: usize) -> ConversationStep {
        conversation("alice", "hello").with_memory(Message::assistant(format!(
            "Julio thought: {}",
            thought_of(words)
        )))
    }

    #[tokio::test]
    async fn single_part_is_a_reply() {
        let computer = ScriptedComputer::default().on(DirectiveKind::Dialog, &["gm alice!"]);
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::constant(0.5));

        let spoken = say_something(&h.ctx, thought_step(30), &Perception::said("alice", "hello"), None)
            .await
            .unwrap();
        assert_eq!(spoken.parts, 1);
        assert_eq!(spoken.full_message, "gm alice!\n");

        h.sink.settled().await;
        let parts = h.sink.spoken();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].send_as, SendAs::Reply);
        assert_eq!(parts[0].text, "gm alice!");
        assert_eq!(h.last_message("alice").as_deref(), Some("gm alice!\n"));
        assert!(h.computer.calls_of(DirectiveKind::Query).is_empty());
    }

    #[tokio::test]
    async fn multi_part_tags_and_joins() {
        let computer = ScriptedComputer::default()
            .on(DirectiveKind::Dialog, &["one", "two", "three"])
            .on(DirectiveKind::Query, &["no"]);
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::constant(0.5));

        let spoken = say_something(&h.ctx, thought_step(100), &Perception::said("alice", "hello"), None)
            .await
            .unwrap();
        assert_eq!(spoken.parts, 3);
        assert_eq!(spoken.step.len(), thought_step(100).len() + 3);

        h.sink.settled().await;
        let send_as: Vec<SendAs> = h.sink.spoken().iter().map(|a| a.send_as).collect();
        assert_eq!(send_as, vec![SendAs::Reply, SendAs::Message, SendAs::Message]);
        assert_eq!(h.last_message("alice").as_deref(), Some("one\ntwo\nthree\n"));

        // Asked between parts only
        assert_eq!(h.computer.calls_of(DirectiveKind::Query).len(), 2);
        let dialogs = h.computer.calls_of(DirectiveKind::Dialog);
        assert_eq!(
            dialogs[1].instruction,
            "Julio speaks part 2 of 3 of what he just thought, using no more than 40 words."
        );
        assert!(dialogs.iter().all(|c| c.tier == ModelTier::Quality));
    }

    #[tokio::test]
    async fn early_stop_keeps_only_spoken_parts() {
        let computer = ScriptedComputer::default()
            .on(DirectiveKind::Dialog, &["one", "two", "three"])
            .on(DirectiveKind::Query, &["no", "yes"]);
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::constant(0.5));

        let spoken = say_something(&h.ctx, thought_step(100), &Perception::said("alice", "hello"), None)
            .await
            .unwrap();
        assert_eq!(spoken.parts, 2);
        h.sink.settled().await;
        assert_eq!(h.sink.spoken().len(), 2);
        assert_eq!(h.last_message("alice").as_deref(), Some("one\ntwo\n"));
    }

    #[tokio::test]
    async fn cap_limits_parts() {
        let computer = ScriptedComputer::default().on(DirectiveKind::Dialog, &["welcome!"]);
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::constant(0.5));

        let spoken = say_something(&h.ctx, thought_step(100), &Perception::said("bob", "JOINED"), Some(1))
            .await
            .unwrap();
        assert_eq!(spoken.parts, 1);
    }

    #[tokio::test]
    async fn jitter_draws_per_part() {
        let computer = ScriptedComputer::default()
            .on(DirectiveKind::Dialog, &["a", "b"])
            .on(DirectiveKind::Query, &["no"]);
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::new(vec![0.0, 0.999]));

        say_something(&h.ctx, thought_step(60), &Perception::said("alice", "hi"), None)
            .await
            .unwrap();
        let dialogs = h.computer.calls_of(DirectiveKind::Dialog);
        assert!(dialogs[0].instruction.ends_with("no more than 20 words."));
        assert!(dialogs[1].instruction.ends_with("no more than 59 words."));
    }

    #[tokio::test]
    async fn dialog_failure_propagates_without_slot_write() {
        let computer = ScriptedComputer::default().failing(DirectiveKind::Dialog, "speaks", "model down");
        let h = Harness::new(computer, SnapshotPending::empty(), FixedRandom::constant(0.5));

        let result = say_something(&h.ctx, thought_step(10), &Perception::said("alice", "hi"), None).await;
        assert!(matches!(
            result,
            Err(Error::Cognition(CognitionError::ComputationFailed(_)))
        ));
        assert!(h.last_message("alice").is_none());
    }
}
