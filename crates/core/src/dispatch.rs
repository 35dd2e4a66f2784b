//! Outbound actions and the sink they are dispatched to.
//!
//! An [`Action`] is fire-and-forget from the coordinator's point of view:
//! it is handed to a [`DispatchSink`] and never awaited. Spoken parts carry a
//! live [`DialogStream`] so the platform can render partial content while
//! the computation is still running.

use serde::{Deserialize, Serialize};

use crate::cognition::DialogStream;
use crate::perception::PlatformEvent;

/// What the soul is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Speaking a message
    Says,
    /// Reacting to a message
    Reacts,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Says => "says",
            Self::Reacts => "reacts",
        }
    }
}

/// How the platform should deliver the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendAs {
    /// Threaded reply to the originating message
    Reply,
    /// Plain channel message
    Message,
    /// Emoji reaction on the originating message
    Emoji,
}

impl SendAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reply => "reply",
            Self::Message => "message",
            Self::Emoji => "emoji",
        }
    }
}

/// Per-action delivery configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoulActionConfig {
    pub kind: ActionKind,
    pub send_as: SendAs,
}

/// Routing metadata linking an action back to the platform event it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<PlatformEvent>,
    pub config: SoulActionConfig,
}

/// Action payload.
#[derive(Debug)]
pub enum ActionContent {
    /// Fully known content
    Text(String),
    /// Content still being generated
    Stream(DialogStream),
}

/// An outbound instruction.
#[derive(Debug)]
pub struct Action {
    pub kind: ActionKind,
    pub content: ActionContent,
    pub metadata: ActionMetadata,
}

impl Action {
    /// A spoken part whose content arrives as a stream.
    pub fn says(stream: DialogStream, send_as: SendAs, event: Option<PlatformEvent>) -> Self {
        Self {
            kind: ActionKind::Says,
            content: ActionContent::Stream(stream),
            metadata: ActionMetadata {
                event,
                config: SoulActionConfig {
                    kind: ActionKind::Says,
                    send_as,
                },
            },
        }
    }

    /// An emoji reaction to the originating event.
    pub fn reacts(emoji: impl Into<String>, event: Option<PlatformEvent>) -> Self {
        Self {
            kind: ActionKind::Reacts,
            content: ActionContent::Text(emoji.into()),
            metadata: ActionMetadata {
                event,
                config: SoulActionConfig {
                    kind: ActionKind::Reacts,
                    send_as: SendAs::Emoji,
                },
            },
        }
    }

    pub fn send_as(&self) -> SendAs {
        self.metadata.config.send_as
    }
}

/// The outbound sink.
///
/// `dispatch` must not block: implementations that need to consume a stream
/// spawn their own task for it.
pub trait DispatchSink: Send + Sync {
    fn dispatch(&self, action: Action);
}
