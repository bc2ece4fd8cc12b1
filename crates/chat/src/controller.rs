//! Conversation state machine behind the chat view.

use std::sync::Arc;

use futures::future;
use kinochi_llm::ProviderWorker;

use crate::events::{StreamEvent, StreamEventPayload};
use crate::host::{HapticImpact, HapticNotification, HostBridge};
use crate::message::{
    ConversationId, ConversationLog, Message, MessageId, Role, StreamSessionId, StreamState,
    StreamTarget, StreamTransition,
};
use crate::prompts::{GENERIC_ERROR_TEXT, INITIAL_MESSAGE};
use crate::session::{ChatSession, SessionResult, SessionStream, SessionStreamHandle};
use crate::settings::ChatSettings;

/// Builds a fresh [`ChatSession`] at startup and on every reset.
pub trait SessionFactory: Send + Sync {
    fn create_session(&self) -> SessionResult<ChatSession>;
}

impl<F> SessionFactory for F
where
    F: Fn() -> SessionResult<ChatSession> + Send + Sync,
{
    fn create_session(&self) -> SessionResult<ChatSession> {
        self()
    }
}

/// Creates Gemini sessions from loaded settings.
#[derive(Debug, Clone)]
pub struct SettingsSessionFactory {
    settings: ChatSettings,
}

impl SettingsSessionFactory {
    pub fn new(settings: ChatSettings) -> Self {
        Self { settings }
    }
}

impl SessionFactory for SettingsSessionFactory {
    fn create_session(&self) -> SessionResult<ChatSession> {
        ChatSession::new(&self.settings)
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveStream {
    target: StreamTarget,
    placeholder_id: MessageId,
}

/// One submitted turn handed back to the caller's event loop.
pub struct StreamTurn {
    pub target: StreamTarget,
    pub stream: SessionStream,
    pub worker: ProviderWorker,
}

/// Owns the message log, the input buffer and the single active session.
pub struct ConversationController {
    log: ConversationLog,
    input: String,
    stream_state: StreamState,
    conversation_id: ConversationId,
    next_stream_session_id: u64,
    active_stream: Option<ActiveStream>,
    session: Option<ChatSession>,
    session_factory: Arc<dyn SessionFactory>,
    host: Arc<dyn HostBridge>,
}

impl ConversationController {
    pub fn new(session_factory: Arc<dyn SessionFactory>, host: Arc<dyn HostBridge>) -> Self {
        let mut this = Self {
            log: ConversationLog::with_greeting(INITIAL_MESSAGE),
            input: String::new(),
            stream_state: StreamState::Idle,
            conversation_id: ConversationId::new(1),
            next_stream_session_id: 1,
            active_stream: None,
            session: None,
            session_factory,
            host,
        };
        this.install_session();
        this
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.stream_state.is_streaming()
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn active_target(&self) -> Option<StreamTarget> {
        self.active_stream.map(|active| active.target)
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// True for an empty model message while a reply is streaming; the view
    /// renders it as a typing indicator.
    pub fn is_working_placeholder(&self, message: &Message) -> bool {
        message.role == Role::Model && message.text.is_empty() && self.is_loading()
    }

    /// Submits the current input buffer.
    pub fn submit_input(&mut self) -> Option<StreamTurn> {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Starts a turn for `text`.
    ///
    /// No-op (returns `None`) for blank text, while a reply is streaming, or
    /// without a session. When the backend refuses to open a stream the failure
    /// is recorded immediately and `None` is returned.
    pub fn submit(&mut self, text: &str) -> Option<StreamTurn> {
        if text.trim().is_empty() {
            return None;
        }

        if self.session.is_none() {
            tracing::warn!("submit ignored because no chat session is configured");
            return None;
        }

        let target = StreamTarget::new(
            self.conversation_id,
            StreamSessionId::new(self.next_stream_session_id),
        );

        match self.stream_state.apply(StreamTransition::Start(target)) {
            Ok(next_state) => self.stream_state = next_state,
            Err(rejection) => {
                tracing::debug!(?rejection, "submit ignored while a reply is streaming");
                return None;
            }
        }

        // Reserve the session id immediately so follow-up submissions never reuse a target.
        self.next_stream_session_id = self.next_stream_session_id.saturating_add(1);

        self.host.impact_occurred(HapticImpact::Light);

        self.log.push_user(text);
        self.input.clear();
        let placeholder_id = self.log.push_placeholder();
        self.active_stream = Some(ActiveStream {
            target,
            placeholder_id,
        });

        let opened = self.session.as_ref().map(|session| session.open_stream(text));
        match opened {
            Some(Ok(SessionStreamHandle { stream, worker })) => Some(StreamTurn {
                target,
                stream,
                worker,
            }),
            Some(Err(error)) => {
                self.apply_stream_event(StreamEvent::new(
                    target,
                    StreamEventPayload::Failed(error.user_message()),
                ));
                None
            }
            None => None,
        }
    }

    /// Applies one stream event; returns `false` when the event is stale.
    pub fn apply_stream_event(&mut self, event: StreamEvent) -> bool {
        let Some(active_stream) = self.active_stream else {
            tracing::debug!(target = ?event.target, "dropping stream event without active stream");
            return false;
        };

        if active_stream.target != event.target
            || !self.stream_state.accepts_stream_event(event.target)
        {
            // Strict target equality keeps chunks of a discarded session out of the new log.
            tracing::debug!(
                target = ?event.target,
                active = ?active_stream.target,
                "dropping stale stream event"
            );
            return false;
        }

        let transition = event.transition();
        match event.payload {
            StreamEventPayload::Fragment(fragment) => {
                self.log.append_text(active_stream.placeholder_id, &fragment);
            }
            StreamEventPayload::Complete => {
                self.finish_stream(transition);
                self.host
                    .notification_occurred(HapticNotification::Success);
            }
            StreamEventPayload::Failed(message) => {
                self.finish_stream(transition);
                let text = if message.trim().is_empty() {
                    GENERIC_ERROR_TEXT.to_string()
                } else {
                    message
                };
                self.log.push_model(text);
            }
        }

        true
    }

    fn finish_stream(&mut self, transition: Option<StreamTransition>) {
        if let Some(transition) = transition {
            match self.stream_state.apply(transition) {
                Ok(next_state) => self.stream_state = next_state,
                Err(rejection) => {
                    tracing::warn!(?rejection, "terminal stream transition rejected");
                    self.stream_state = StreamState::Idle;
                }
            }
        }
        self.active_stream = None;
    }

    /// Replaces the log with the greeting and starts a new session.
    ///
    /// Any in-flight stream is abandoned; its later events are rejected as stale.
    pub fn reset(&mut self) {
        if let Some(active_stream) = self.active_stream.take() {
            tracing::debug!(target = ?active_stream.target, "abandoning in-flight stream on reset");
        }

        self.stream_state = self
            .stream_state
            .apply(StreamTransition::ResetToIdle)
            .unwrap_or_default();
        self.conversation_id = self.conversation_id.next();
        self.log = ConversationLog::with_greeting(INITIAL_MESSAGE);
        self.input.clear();

        self.session = None;
        self.install_session();
    }

    /// Runs the backend worker of `turn` and applies all of its events.
    pub async fn drive_turn(&mut self, turn: StreamTurn) {
        let StreamTurn {
            target,
            mut stream,
            worker,
        } = turn;

        let reader = async {
            while let Some(payload) = stream.next().await {
                self.apply_stream_event(StreamEvent::new(target, payload));
            }
        };

        future::join(worker, reader).await;
    }

    fn install_session(&mut self) {
        match self.session_factory.create_session() {
            Ok(session) => self.session = Some(session),
            Err(error) => {
                tracing::error!(error = %error, "failed to create chat session");
                self.session = None;
            }
        }
    }
}
