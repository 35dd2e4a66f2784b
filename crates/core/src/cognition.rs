//! Step computation: the opaque, LLM-backed "cognitive step" abstraction.
//!
//! Every reasoning operation takes an immutable [`ConversationStep`] and
//! either returns a value (a decision, a yes/no answer, a thought, an emoji)
//! or a *new* step with one more memory appended. The input step is never
//! modified, so callers can fan several computations out over one step.
//!
//! Spoken dialog is streamed: [`StepComputer::stream_dialog`] hands back a
//! [`StreamingStep`] whose [`DialogStream`] fills incrementally while the
//! computation runs, plus a completion that resolves to the next step.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::CognitionError;
use crate::step::ConversationStep;

/// Cost/accuracy tier a computation should run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Cheap default model
    #[default]
    Fast,
    /// Higher-cost, higher-accuracy model
    Quality,
}

/// Producer half of a live dialog stream.
#[derive(Clone)]
pub struct DialogSender {
    tx: mpsc::UnboundedSender<String>,
}

impl DialogSender {
    /// Push a chunk. Returns `false` once every consumer has gone away.
    pub fn send(&self, chunk: impl Into<String>) -> bool {
        self.tx.send(chunk.into()).is_ok()
    }
}

/// Consumer half of a live dialog stream. Ends when the producer finishes.
pub struct DialogStream {
    inner: UnboundedReceiverStream<String>,
}

impl DialogStream {
    /// Drain the stream and concatenate every chunk.
    pub async fn collect_text(mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(&chunk);
        }
        text
    }
}

impl Stream for DialogStream {
    type Item = String;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl std::fmt::Debug for DialogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DialogStream")
    }
}

/// Create a connected dialog sender/stream pair.
pub fn dialog_channel() -> (DialogSender, DialogStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DialogSender { tx },
        DialogStream {
            inner: UnboundedReceiverStream::new(rx),
        },
    )
}

/// The producer side of a [`StreamingStep`].
pub struct StreamingProducer {
    chunks: DialogSender,
    done: oneshot::Sender<Result<ConversationStep, CognitionError>>,
}

impl StreamingProducer {
    /// Forward a partial chunk to whoever consumes the dialog stream.
    pub fn send_chunk(&self, chunk: impl Into<String>) -> bool {
        self.chunks.send(chunk)
    }

    /// Resolve the completion and close the dialog stream.
    pub fn finish(self, result: Result<ConversationStep, CognitionError>) {
        let _ = self.done.send(result);
    }
}

/// A dialog computation in flight.
pub struct StreamingStep {
    /// Live content; may be forwarded before the computation completes.
    pub stream: DialogStream,
    completion: oneshot::Receiver<Result<ConversationStep, CognitionError>>,
}

impl StreamingStep {
    /// Create a connected producer/streaming-step pair.
    pub fn channel() -> (StreamingProducer, StreamingStep) {
        let (chunks, stream) = dialog_channel();
        let (done, completion) = oneshot::channel();
        (
            StreamingProducer { chunks, done },
            StreamingStep { stream, completion },
        )
    }

    /// Split into the live stream and a handle that awaits the next step.
    pub fn into_parts(self) -> (DialogStream, StepCompletion) {
        (
            self.stream,
            StepCompletion {
                rx: self.completion,
            },
        )
    }
}

/// Awaitable completion of a [`StreamingStep`].
pub struct StepCompletion {
    rx: oneshot::Receiver<Result<ConversationStep, CognitionError>>,
}

impl StepCompletion {
    /// Wait for the computation to finish. Does not re-issue it.
    pub async fn wait(self) -> Result<ConversationStep, CognitionError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(CognitionError::StreamInterrupted(
                "dialog producer dropped before completing".into(),
            )),
        }
    }
}

/// The step computation collaborator.
///
/// Implementations: provider-backed (agent crate), scripted (replays/tests).
#[async_trait]
pub trait StepComputer: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Pick exactly one of `choices` for `description`.
    async fn decide(
        &self,
        step: &ConversationStep,
        description: &str,
        choices: &[String],
        tier: ModelTier,
    ) -> Result<String, CognitionError>;

    /// Judge whether `statement` is true in the context of `step`.
    async fn query(&self, step: &ConversationStep, statement: &str, tier: ModelTier) -> Result<bool, CognitionError>;

    /// Compute an internal thought and return only its text.
    async fn think(&self, step: &ConversationStep, instruction: &str, tier: ModelTier) -> Result<String, CognitionError>;

    /// Compute an internal thought and return the step with it appended.
    async fn next_thought(
        &self,
        step: &ConversationStep,
        instruction: &str,
        tier: ModelTier,
    ) -> Result<ConversationStep, CognitionError>;

    /// Start a spoken utterance; the returned completion yields the step with it appended.
    async fn stream_dialog(
        &self,
        step: &ConversationStep,
        instruction: &str,
        tier: ModelTier,
    ) -> Result<StreamingStep, CognitionError>;

    /// Pick a single emoji reacting to the latest memory.
    async fn emoji(&self, step: &ConversationStep, tier: ModelTier) -> Result<String, CognitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn stream_delivers_chunks_then_ends() {
        let (producer, streaming) = StreamingStep::channel();
        let (stream, completion) = streaming.into_parts();

        producer.send_chunk("Hello ");
        producer.send_chunk("there");
        let step = ConversationStep::new("Julio").with_memory(Message::assistant("Julio said: Hello there"));
        producer.finish(Ok(step));

        assert_eq!(stream.collect_text().await, "Hello there");
        let next = completion.wait().await.unwrap();
        assert_eq!(next.len(), 1);
    }

    #[tokio::test]
    async fn dropped_producer_interrupts_completion() {
        let (producer, streaming) = StreamingStep::channel();
        drop(producer);
        let (stream, completion) = streaming.into_parts();
        assert_eq!(stream.collect_text().await, "");
        assert!(matches!(
            completion.wait().await,
            Err(CognitionError::StreamInterrupted(_))
        ));
    }

    #[test]
    fn send_after_consumer_drop_reports_false() {
        let (sender, stream) = dialog_channel();
        drop(stream);
        assert!(!sender.send("lost"));
    }
}
