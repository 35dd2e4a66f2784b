//! Dispatch sinks that ship with SoulTurn.
//!
//! Platform bindings live outside this workspace. These sinks cover the
//! local cases: logging actions, and recording them for replays and tests.

use std::sync::{Arc, Mutex, PoisonError};

use soulturn_core::dispatch::{Action, ActionContent, ActionKind, DispatchSink, SendAs};
use soulturn_core::perception::PlatformEvent;
use tokio::task::JoinHandle;
use tracing::info;

/// Logs every action; streamed content is drained in a background task.
pub struct TracingSink;

impl DispatchSink for TracingSink {
    fn dispatch(&self, action: Action) {
        let kind = action.kind.as_str();
        let send_as = action.send_as().as_str();
        match action.content {
            ActionContent::Text(text) => {
                info!(kind, send_as, content = %text, "Action dispatched");
            }
            ActionContent::Stream(stream) => {
                info!(kind, send_as, "Streaming action dispatched");
                tokio::spawn(async move {
                    let text = stream.collect_text().await;
                    info!(kind, send_as, content = %text, "Stream finished");
                });
            }
        }
    }
}

/// An action as a [`RecordingSink`] saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAction {
    pub kind: ActionKind,
    pub send_as: SendAs,
    pub event: Option<PlatformEvent>,
    /// Full content; for streams, filled in once the stream ends
    pub text: String,
    /// Whether the content is final
    pub complete: bool,
}

/// Records every dispatched action in dispatch order.
///
/// Streams are drained in background tasks; call [`RecordingSink::settled`]
/// before inspecting streamed text.
#[derive(Default)]
pub struct RecordingSink {
    actions: Arc<Mutex<Vec<RecordedAction>>>,
    drains: Mutex<Vec<JoinHandle<()>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until every stream dispatched so far has ended.
    pub async fn settled(&self) {
        let drains: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.drains.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for drain in drains {
            let _ = drain.await;
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn actions(&self) -> Vec<RecordedAction> {
        self.actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded spoken parts, in order.
    pub fn spoken(&self) -> Vec<RecordedAction> {
        self.actions()
            .into_iter()
            .filter(|a| a.kind == ActionKind::Says)
            .collect()
    }

    /// Recorded reactions, in order.
    pub fn reactions(&self) -> Vec<RecordedAction> {
        self.actions()
            .into_iter()
            .filter(|a| a.kind == ActionKind::Reacts)
            .collect()
    }
}

impl DispatchSink for RecordingSink {
    fn dispatch(&self, action: Action) {
        let send_as = action.send_as();
        let mut actions = self.actions.lock().unwrap_or_else(PoisonError::into_inner);
        let index = actions.len();
        let (text, stream) = match action.content {
            ActionContent::Text(text) => (text, None),
            ActionContent::Stream(stream) => (String::new(), Some(stream)),
        };
        actions.push(RecordedAction {
            kind: action.kind,
            send_as,
            event: action.metadata.event,
            text,
            complete: stream.is_none(),
        });
        drop(actions);

        if let Some(stream) = stream {
            let actions = Arc::clone(&self.actions);
            let drain = tokio::spawn(async move {
                let text = stream.collect_text().await;
                let mut actions = actions.lock().unwrap_or_else(PoisonError::into_inner);
                if let Some(recorded) = actions.get_mut(index) {
                    recorded.text = text;
                    recorded.complete = true;
                }
            });
            self.drains
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(drain);
        }
    }
}
