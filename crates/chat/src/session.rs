//! Chat session adapter over one backend dialogue context.

use std::sync::Arc;

use arc_swap::ArcSwap;
use futures::future;
use kinochi_llm::{
    ChatRequest, LlmProvider, Model, ProviderError, ProviderEventStream, ProviderMessage,
    ProviderWorker, StreamEventPayload as ProviderEvent, create_provider,
};
use snafu::{ResultExt, Snafu};

use crate::events::StreamEventPayload;
use crate::prompts::{BACKEND_ERROR_TEXT, NO_ANSWER_TEXT, STREAMING_ERROR_TEXT, SYSTEM_PROMPT};
use crate::settings::{ChatSettings, SettingsError};

/// Fixed for the lifetime of a [`ChatSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProfile {
    pub model: Model,
    pub system_instruction: String,
}

impl SessionProfile {
    pub fn new(model: Model, system_instruction: impl Into<String>) -> Self {
        Self {
            model,
            system_instruction: system_instruction.into(),
        }
    }

    pub fn from_settings(settings: &ChatSettings) -> Self {
        Self::new(settings.model_profile(), SYSTEM_PROMPT)
    }
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self::new(Model::default(), SYSTEM_PROMPT)
    }
}

type History = Arc<ArcSwap<Vec<ProviderMessage>>>;

/// One continuous dialogue with the backend.
///
/// A session never resets; a new conversation needs a new instance. Turns are
/// committed to the history only after the backend answered successfully.
pub struct ChatSession {
    provider: Arc<dyn LlmProvider>,
    profile: SessionProfile,
    history: History,
}

impl ChatSession {
    /// Builds a Gemini-backed session. Fails when no credential is configured.
    pub fn new(settings: &ChatSettings) -> SessionResult<Self> {
        let config = settings.to_provider_config().context(ConfigurationSnafu {
            stage: "session-provider-config",
        })?;
        let provider = create_provider(config).context(ProviderSetupSnafu {
            stage: "session-create-provider",
        })?;

        Ok(Self::with_provider(
            provider,
            SessionProfile::from_settings(settings),
        ))
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>, profile: SessionProfile) -> Self {
        Self {
            provider,
            profile,
            history: Arc::new(ArcSwap::from_pointee(Vec::new())),
        }
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    /// Snapshot of the committed dialogue turns.
    pub fn history(&self) -> Arc<Vec<ProviderMessage>> {
        self.history.load_full()
    }

    /// Sends `text` and waits for the complete reply.
    pub async fn send_message(&self, text: &str) -> SessionResult<String> {
        let request = self.build_request(text);

        match self.provider.complete(request).await {
            Ok(reply) if reply.is_empty() => Ok(NO_ANSWER_TEXT.to_string()),
            Ok(reply) => {
                commit_turn(&self.history, text, &reply);
                Ok(reply)
            }
            Err(error) => {
                tracing::error!(
                    provider_id = %self.provider.id(),
                    error = %error,
                    "backend request failed"
                );
                BackendSnafu {
                    stage: "send-message",
                }
                .fail()
            }
        }
    }

    /// Sends `text` and calls `on_fragment` for every non-empty fragment in
    /// arrival order; resolves once the backend completes the reply.
    pub async fn send_message_stream<F>(&self, text: &str, mut on_fragment: F) -> SessionResult<()>
    where
        F: FnMut(&str),
    {
        let SessionStreamHandle { mut stream, worker } = self.open_stream(text)?;

        let reader = async move {
            while let Some(payload) = stream.next().await {
                match payload {
                    StreamEventPayload::Fragment(fragment) => on_fragment(&fragment),
                    StreamEventPayload::Complete => return Ok(()),
                    StreamEventPayload::Failed(_) => break,
                }
            }

            StreamingSnafu {
                stage: "send-message-stream",
            }
            .fail()
        };

        let ((), result) = future::join(worker, reader).await;
        result
    }

    /// Opens a streaming turn for callers that run their own event loop.
    ///
    /// The worker must be polled (usually spawned on the tokio runtime) for the
    /// stream to make progress.
    pub fn open_stream(&self, text: &str) -> SessionResult<SessionStreamHandle> {
        let request = self.build_request(text);

        let handle = match self.provider.stream_chat(request) {
            Ok(handle) => handle,
            Err(error) => {
                tracing::error!(
                    provider_id = %self.provider.id(),
                    error = %error,
                    "failed to open backend stream"
                );
                return StreamingSnafu {
                    stage: "open-stream",
                }
                .fail();
            }
        };

        Ok(SessionStreamHandle {
            stream: SessionStream {
                events: handle.stream,
                history: self.history.clone(),
                prompt: text.to_string(),
                reply: String::new(),
                finished: false,
            },
            worker: handle.worker,
        })
    }

    fn build_request(&self, text: &str) -> ChatRequest {
        let mut messages = Vec::clone(&self.history.load_full());
        messages.push(ProviderMessage::user(text));

        ChatRequest::new(self.profile.model.id.clone(), messages)
            .with_preamble(self.profile.system_instruction.clone())
            .with_temperature(self.profile.model.temperature)
            .with_max_tokens(self.profile.model.max_tokens)
    }
}

fn commit_turn(history: &History, prompt: &str, reply: &str) {
    history.rcu(|turns| {
        let mut next = Vec::clone(turns);
        next.push(ProviderMessage::user(prompt));
        next.push(ProviderMessage::assistant(reply));
        next
    });
}

pub struct SessionStreamHandle {
    pub stream: SessionStream,
    pub worker: ProviderWorker,
}

/// Reader side of one streaming turn.
///
/// Yields fragments followed by exactly one terminal payload, then `None`.
pub struct SessionStream {
    events: ProviderEventStream,
    history: History,
    prompt: String,
    reply: String,
    finished: bool,
}

impl SessionStream {
    pub async fn next(&mut self) -> Option<StreamEventPayload> {
        if self.finished {
            return None;
        }

        loop {
            let payload = match self.events.recv().await {
                Some(ProviderEvent::Delta(fragment)) if fragment.is_empty() => continue,
                Some(ProviderEvent::Delta(fragment)) => {
                    self.reply.push_str(&fragment);
                    StreamEventPayload::Fragment(fragment)
                }
                Some(ProviderEvent::Done) => {
                    self.finished = true;
                    // History never holds an empty model turn.
                    if !self.reply.is_empty() {
                        commit_turn(&self.history, &self.prompt, &self.reply);
                    }
                    StreamEventPayload::Complete
                }
                Some(ProviderEvent::Error(details)) => {
                    self.finished = true;
                    tracing::error!(error = %details, "backend stream failed");
                    StreamEventPayload::Failed(STREAMING_ERROR_TEXT.to_string())
                }
                None => {
                    self.finished = true;
                    tracing::warn!("backend stream ended before a terminal event");
                    StreamEventPayload::Failed(STREAMING_ERROR_TEXT.to_string())
                }
            };

            return Some(payload);
        }
    }

}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("chat session is not configured on `{stage}`: {source}"))]
    Configuration {
        stage: &'static str,
        source: SettingsError,
    },
    #[snafu(display("chat backend could not be created on `{stage}`: {source}"))]
    ProviderSetup {
        stage: &'static str,
        source: ProviderError,
    },
    #[snafu(display("{}", BACKEND_ERROR_TEXT))]
    Backend { stage: &'static str },
    #[snafu(display("{}", STREAMING_ERROR_TEXT))]
    Streaming { stage: &'static str },
}

impl SessionError {
    /// Text safe to show in the conversation.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use kinochi_llm::Role;

    use super::*;
    use crate::test_support::{Script, ScriptStep, ScriptedProvider};

    fn session(provider: Arc<ScriptedProvider>) -> ChatSession {
        ChatSession::with_provider(provider, SessionProfile::default())
    }

    #[test]
    fn missing_credential_fails_at_construction() {
        let result = ChatSession::new(&ChatSettings::default());
        let error = result.err().expect("construction must fail");
        assert!(matches!(error, SessionError::Configuration { .. }));
    }

    #[test]
    fn configured_credential_builds_session() {
        let settings = ChatSettings {
            api_key: "key".to_string(),
            ..ChatSettings::default()
        };

        let session = ChatSession::new(&settings).expect("session");
        assert_eq!(session.profile().model.id, "gemini-3-flash-preview");
        assert_eq!(session.profile().model.temperature, 0.7);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn send_message_returns_reply_and_remembers_turn() {
        let provider = ScriptedProvider::new(vec![
            Script::Reply(Ok("Inception (2010) tavsiya qilaman.")),
            Script::Reply(Ok("Interstellar ham yoqadi.")),
        ]);
        let session = session(provider.clone());

        let first = session.send_message("Nolan filmlari").await.expect("reply");
        assert_eq!(first, "Inception (2010) tavsiya qilaman.");
        session.send_message("Yana?").await.expect("reply");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(
            requests[1].messages,
            vec![
                ProviderMessage::user("Nolan filmlari"),
                ProviderMessage::assistant("Inception (2010) tavsiya qilaman."),
                ProviderMessage::user("Yana?"),
            ]
        );
        assert_eq!(requests[0].preamble.as_deref(), Some(SYSTEM_PROMPT));
        assert_eq!(requests[0].temperature, Some(0.7));
        assert_eq!(requests[0].model_id, "gemini-3-flash-preview");
    }

    #[tokio::test]
    async fn empty_reply_falls_back_to_fixed_text() {
        let provider = ScriptedProvider::new(vec![Script::Reply(Ok(""))]);
        let session = session(provider);

        let reply = session.send_message("Salom").await.expect("reply");
        assert_eq!(reply, NO_ANSWER_TEXT);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn whitespace_reply_is_returned_unchanged() {
        let provider = ScriptedProvider::new(vec![Script::Reply(Ok("  "))]);
        let session = session(provider);

        let reply = session.send_message("Salom").await.expect("reply");
        assert_eq!(reply, "  ");
    }

    #[tokio::test]
    async fn empty_stream_completes_without_remembering_turn() {
        let provider = ScriptedProvider::new(vec![Script::Stream(Vec::new())]);
        let session = session(provider);

        let mut fragments = Vec::new();
        session
            .send_message_stream("Salom", |fragment| fragments.push(fragment.to_string()))
            .await
            .expect("stream completes");

        assert!(fragments.is_empty());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_hides_details() {
        let provider = ScriptedProvider::new(vec![Script::Reply(Err("quota exceeded for key"))]);
        let session = session(provider);

        let error = session.send_message("Salom").await.unwrap_err();
        assert!(matches!(error, SessionError::Backend { .. }));
        assert_eq!(error.user_message(), BACKEND_ERROR_TEXT);
        assert!(!error.to_string().contains("quota"));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn stream_delivers_non_empty_fragments_in_order() {
        let provider = ScriptedProvider::new(vec![Script::Stream(vec![
            ScriptStep::Fragment("Sal"),
            ScriptStep::Fragment(""),
            ScriptStep::Fragment("om"),
        ])]);
        let session = session(provider);

        let mut fragments = Vec::new();
        session
            .send_message_stream("Salom de", |fragment| fragments.push(fragment.to_string()))
            .await
            .expect("stream completes");

        assert_eq!(fragments, vec!["Sal".to_string(), "om".to_string()]);
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "Salom");
    }

    #[tokio::test]
    async fn mid_stream_failure_is_a_streaming_error() {
        let provider = ScriptedProvider::new(vec![Script::Stream(vec![
            ScriptStep::Fragment("Hel"),
            ScriptStep::Fail("connection reset by peer"),
        ])]);
        let session = session(provider);

        let mut fragments = Vec::new();
        let error = session
            .send_message_stream("Salom", |fragment| fragments.push(fragment.to_string()))
            .await
            .unwrap_err();

        assert_eq!(fragments, vec!["Hel".to_string()]);
        assert!(matches!(error, SessionError::Streaming { .. }));
        assert_eq!(error.user_message(), STREAMING_ERROR_TEXT);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn stream_rejected_before_first_fragment() {
        let provider = ScriptedProvider::new(vec![Script::RejectStream]);
        let session = session(provider);

        let error = session
            .send_message_stream("Salom", |_| panic!("no fragment expected"))
            .await
            .unwrap_err();
        assert!(matches!(error, SessionError::Streaming { .. }));
    }

    #[tokio::test]
    async fn stream_closed_without_terminal_event_fails() {
        let provider = ScriptedProvider::new(vec![Script::Stream(vec![
            ScriptStep::Fragment("Hel"),
            ScriptStep::Close,
        ])]);
        let session = session(provider);

        let SessionStreamHandle { mut stream, worker } =
            session.open_stream("Salom").expect("stream opens");
        worker.await;

        assert_eq!(
            stream.next().await,
            Some(StreamEventPayload::Fragment("Hel".to_string()))
        );
        assert_eq!(
            stream.next().await,
            Some(StreamEventPayload::Failed(STREAMING_ERROR_TEXT.to_string()))
        );
        assert_eq!(stream.next().await, None);
        assert!(session.history().is_empty());
    }
}
