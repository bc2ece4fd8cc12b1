use chrono::{DateTime, Local};

/// Identifier of one conversation epoch.
///
/// A fresh id is minted on every reset so events from a discarded session can
/// never be routed into the new log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub u64);

impl ConversationId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The epoch minted by the next reset.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// Stable identifier for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifier for one submitted turn.
///
/// This must change on every submit so stale chunks can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamSessionId(pub u64);

impl StreamSessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Stream routing key used for stale-chunk rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamTarget {
    pub conversation_id: ConversationId,
    pub session_id: StreamSessionId,
}

impl StreamTarget {
    /// Pairs a conversation epoch with one turn inside it.
    pub const fn new(conversation_id: ConversationId, session_id: StreamSessionId) -> Self {
        Self {
            conversation_id,
            session_id,
        }
    }
}

/// Chat speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Model,
    System,
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    /// Stamps the message with the current local time.
    pub fn new(id: MessageId, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: Local::now(),
        }
    }

    /// A submitted user turn.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Role::User, text)
    }

    /// A finished model entry such as the greeting or an error notice.
    pub fn model(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Role::Model, text)
    }

    /// Creates the empty model entry that grows while a reply streams in.
    pub fn placeholder(id: MessageId) -> Self {
        Self::new(id, Role::Model, String::new())
    }

    /// Wall-clock label shown under the bubble.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Ordered message log; insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationLog {
    messages: Vec<Message>,
    next_message_id: u64,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationLog {
    /// An empty log; ids start at 1.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_message_id: 1,
        }
    }

    /// Creates a log holding only the model greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut log = Self::new();
        log.push_model(greeting);
        log
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> MessageId {
        let id = self.alloc_message_id();
        self.messages.push(Message::user(id, text));
        id
    }

    pub fn push_model(&mut self, text: impl Into<String>) -> MessageId {
        let id = self.alloc_message_id();
        self.messages.push(Message::model(id, text));
        id
    }

    pub fn push_placeholder(&mut self) -> MessageId {
        let id = self.alloc_message_id();
        self.messages.push(Message::placeholder(id));
        id
    }

    /// Appends a fragment to an existing message in place.
    ///
    /// Returns `false` when no message with `id` exists.
    pub fn append_text(&mut self, id: MessageId, fragment: &str) -> bool {
        match self.messages.iter_mut().find(|message| message.id == id) {
            Some(message) => {
                message.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    fn alloc_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id.max(1));
        self.next_message_id = id.0.saturating_add(1);
        id
    }
}

/// Stream state boundary for conversation orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Streaming(StreamTarget),
}

/// State transition input for stream lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTransition {
    Start(StreamTarget),
    Complete(StreamTarget),
    Fail(StreamTarget),
    ResetToIdle,
}

/// Rejection reason for illegal stream transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTransitionRejection {
    AlreadyStreaming {
        active: StreamTarget,
        attempted: StreamTarget,
    },
    NoActiveStream,
    SessionMismatch {
        active: StreamTarget,
        attempted: StreamTarget,
    },
}

pub type StreamTransitionResult = Result<StreamState, StreamTransitionRejection>;

impl StreamState {
    /// Returns active streaming target if and only if state is `Streaming`.
    pub fn active_target(&self) -> Option<StreamTarget> {
        match self {
            Self::Streaming(target) => Some(*target),
            Self::Idle => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }

    /// Returns true when incoming stream data matches the active session.
    pub fn accepts_stream_event(&self, target: StreamTarget) -> bool {
        matches!(self, Self::Streaming(active) if *active == target)
    }

    /// Applies one transition deterministically.
    ///
    /// Terminal transitions (`Complete`/`Fail`) must match the active target exactly.
    pub fn apply(&self, transition: StreamTransition) -> StreamTransitionResult {
        match transition {
            StreamTransition::Start(target) => self.apply_start(target),
            StreamTransition::Complete(target) | StreamTransition::Fail(target) => {
                self.apply_finish(target)
            }
            StreamTransition::ResetToIdle => Ok(Self::Idle),
        }
    }

    fn apply_start(&self, target: StreamTarget) -> StreamTransitionResult {
        match self {
            Self::Streaming(active) => Err(StreamTransitionRejection::AlreadyStreaming {
                active: *active,
                attempted: target,
            }),
            Self::Idle => Ok(Self::Streaming(target)),
        }
    }

    fn apply_finish(&self, target: StreamTarget) -> StreamTransitionResult {
        match self {
            Self::Streaming(active) if *active == target => Ok(Self::Idle),
            Self::Streaming(active) => Err(StreamTransitionRejection::SessionMismatch {
                active: *active,
                attempted: target,
            }),
            Self::Idle => Err(StreamTransitionRejection::NoActiveStream),
        }
    }
}
