use crate::message::{StreamTarget, StreamTransition};

/// Emitted when the user submits a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Emitted when the user asks for a fresh conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewConversation;

/// Session-level stream payload in chat domain language.
///
/// `Failed` always carries user-facing text; backend details never reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEventPayload {
    Fragment(String),
    Complete,
    Failed(String),
}

/// Stream payload routed to the turn that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub target: StreamTarget,
    pub payload: StreamEventPayload,
}

impl StreamEvent {
    pub fn new(target: StreamTarget, payload: StreamEventPayload) -> Self {
        Self { target, payload }
    }

    /// Maps terminal payloads to stream state transitions.
    ///
    /// Fragments return `None` because they mutate the placeholder text, not the
    /// stream lifecycle.
    pub fn transition(&self) -> Option<StreamTransition> {
        match &self.payload {
            StreamEventPayload::Fragment(_) => None,
            StreamEventPayload::Complete => Some(StreamTransition::Complete(self.target)),
            StreamEventPayload::Failed(_) => Some(StreamTransition::Fail(self.target)),
        }
    }
}
