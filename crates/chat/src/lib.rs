//! Conversation core for the AI-Kinochi assistant: message log, streaming
//! session adapter, controller state machine, settings and host bridge.

mod controller;
mod events;
mod host;
mod message;
pub mod prompts;
mod session;
mod settings;

#[cfg(test)]
mod test_support;

pub use controller::{
    ConversationController, SessionFactory, SettingsSessionFactory, StreamTurn,
};
pub use events::{NewConversation, StreamEvent, StreamEventPayload, Submit};
pub use host::{
    HapticImpact, HapticNotification, HostBridge, HostTheme, NoopHost, TracingHost,
    initialize_host,
};
pub use message::{
    ConversationId, ConversationLog, Message, MessageId, Role, StreamSessionId, StreamState,
    StreamTarget, StreamTransition, StreamTransitionRejection, StreamTransitionResult,
};
pub use session::{
    ChatSession, SessionError, SessionProfile, SessionResult, SessionStream, SessionStreamHandle,
};
pub use settings::{ChatSettings, SettingsError, SettingsResult};
