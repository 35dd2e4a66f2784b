//! Shared test helpers for turn tests.

use std::sync::{Arc, Mutex};

use soulturn_core::error::ProviderError;
use soulturn_core::memory::{last_message_key, SlotStore};
use soulturn_core::message::Message;
use soulturn_core::perception::{PendingPerceptions, Perception};
use soulturn_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use soulturn_core::step::ConversationStep;
use soulturn_memory::InMemorySlots;

use crate::context::TurnContext;
use crate::random::FixedRandom;
use crate::scripted::ScriptedComputer;
use crate::sinks::RecordingSink;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Pending perceptions that change between calls.
///
/// Each call to `pending` returns the next snapshot; the last one repeats.
pub struct SnapshotPending {
    snapshots: Vec<Vec<Perception>>,
    calls: Mutex<usize>,
}

impl SnapshotPending {
    pub fn new(snapshots: Vec<Vec<Perception>>) -> Self {
        Self {
            snapshots,
            calls: Mutex::new(0),
        }
    }

    pub fn fixed(pending: Vec<Perception>) -> Self {
        Self::new(vec![pending])
    }

    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }
}

impl PendingPerceptions for SnapshotPending {
    fn pending(&self) -> Vec<Perception> {
        let mut calls = self.calls.lock().unwrap();
        let index = (*calls).min(self.snapshots.len().saturating_sub(1));
        *calls += 1;
        self.snapshots.get(index).cloned().unwrap_or_default()
    }
}

/// A fully wired context whose collaborators the test can inspect.
pub struct Harness {
    pub ctx: TurnContext,
    pub computer: Arc<ScriptedComputer>,
    pub sink: Arc<RecordingSink>,
    pub slots: Arc<InMemorySlots>,
}

impl Harness {
    pub fn new(computer: ScriptedComputer, pending: SnapshotPending, rng: FixedRandom) -> Self {
        let computer = Arc::new(computer);
        let sink = Arc::new(RecordingSink::new());
        let slots = Arc::new(InMemorySlots::new());
        let ctx = TurnContext::new(
            Arc::new(pending),
            sink.clone(),
            slots.clone(),
            computer.clone(),
        )
        .with_rng(Arc::new(rng));
        Self {
            ctx,
            computer,
            sink,
            slots,
        }
    }

    pub fn last_message(&self, user: &str) -> Option<String> {
        self.slots
            .load(&last_message_key(user))
            .unwrap()
            .and_then(|v| v.as_str().map(str::to_string))
    }
}

/// A step whose latest memory is `user` saying `content`.
pub fn conversation(user: &str, content: &str) -> ConversationStep {
    ConversationStep::new("Julio").with_memory(Message::user(content).named(user))
}

/// A thought text of `total` words.
pub fn thought_of(total: usize) -> String {
    (1..=total)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}
