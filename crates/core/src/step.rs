//! Conversation steps: immutable snapshots of accumulated memory.
//!
//! A step is a persistent, append-only chain of [`Message`]s. Appending
//! returns a new step that shares every existing node with the old one, so
//! computations running concurrently against the same step never observe
//! each other's appends.
//!
//! ```text
//! initial ──► [m1] ◄── [m2] ◄── [m3a]   (step A)
//!                        ▲
//!                        └──── [m3b]    (step B, shares m1..m2)
//! ```

use std::sync::Arc;

use crate::message::Message;

struct Node {
    message: Message,
    prev: Option<Arc<Node>>,
    len: usize,
}

impl Drop for Node {
    // Unlink iteratively; recursive drops overflow the stack on long chains.
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut node) => prev = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// An immutable snapshot of the soul's conversational memory.
#[derive(Clone)]
pub struct ConversationStep {
    soul_name: Arc<str>,
    head: Option<Arc<Node>>,
}

impl ConversationStep {
    /// Create an empty step for the named soul.
    pub fn new(soul_name: impl Into<String>) -> Self {
        Self {
            soul_name: Arc::from(soul_name.into()),
            head: None,
        }
    }

    /// Create a step seeded with the given memories, oldest first.
    pub fn from_memories(soul_name: impl Into<String>, memories: impl IntoIterator<Item = Message>) -> Self {
        memories
            .into_iter()
            .fold(Self::new(soul_name), |step, message| step.with_memory(message))
    }

    /// The soul this step belongs to.
    pub fn soul_name(&self) -> &str {
        &self.soul_name
    }

    /// Return a new step with `message` appended. `self` is left untouched.
    pub fn with_memory(&self, message: Message) -> Self {
        let len = self.len() + 1;
        Self {
            soul_name: Arc::clone(&self.soul_name),
            head: Some(Arc::new(Node {
                message,
                prev: self.head.clone(),
                len,
            })),
        }
    }

    /// Number of memories in the chain.
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |node| node.len)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// The most recent memory.
    pub fn last_memory(&self) -> Option<&Message> {
        self.head.as_deref().map(|node| &node.message)
    }

    /// Iterate memories newest first without copying.
    pub fn iter_rev(&self) -> impl Iterator<Item = &Message> {
        let mut cursor = self.head.as_deref();
        std::iter::from_fn(move || {
            let node = cursor?;
            cursor = node.prev.as_deref();
            Some(&node.message)
        })
    }

    /// All memories, oldest first.
    pub fn memories(&self) -> Vec<Message> {
        let mut out: Vec<Message> = self.iter_rev().cloned().collect();
        out.reverse();
        out
    }

    /// True when both steps are the very same snapshot (same chain head).
    pub fn same_chain(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// True when `self` was derived from `ancestor` by appending only.
    pub fn extends(&self, ancestor: &Self) -> bool {
        let Some(target) = &ancestor.head else {
            return true;
        };
        let mut cursor = self.head.as_ref();
        while let Some(node) = cursor {
            if Arc::ptr_eq(node, target) {
                return true;
            }
            if node.len < target.len {
                return false;
            }
            cursor = node.prev.as_ref();
        }
        false
    }
}

impl std::fmt::Debug for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStep")
            .field("soul_name", &self.soul_name)
            .field("len", &self.len())
            .field("last", &self.last_memory().map(|m| &m.content))
            .finish()
    }
}
