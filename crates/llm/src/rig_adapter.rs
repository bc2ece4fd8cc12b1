use futures::StreamExt;
use rig::completion::{CompletionModel, CompletionRequestBuilder, Message as RigMessage};
use rig::message::AssistantContent;
use rig::prelude::CompletionClient;
use rig::providers::gemini;
use rig::streaming::StreamedAssistantContent;
use snafu::{ResultExt, ensure};
use tokio::sync::{mpsc, oneshot};

use super::model::GEMINI_PROVIDER_ID;
use super::provider::{
    BoxFuture, ChatRequest, CompletionsFailedSnafu, EmptyMessageSetSnafu, HttpClientSnafu,
    LlmProvider, MissingApiKeySnafu, ProviderConfig, ProviderError, ProviderMessage,
    ProviderResult, ProviderStreamHandle, ProviderWorker, Role, StreamEventPayload,
    make_event_stream,
};

pub const RIG_GEMINI_PROVIDER_ID: &str = GEMINI_PROVIDER_ID;

/// Gemini backend driven through rig-core's provider client.
pub struct RigProviderAdapter {
    config: ProviderConfig,
}

impl RigProviderAdapter {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        ensure!(
            !config.api_key.is_empty(),
            MissingApiKeySnafu {
                stage: "rig-adapter-new",
                provider_id: config.provider_id.clone(),
            }
        );

        Ok(Self { config })
    }

    fn build_client(config: &ProviderConfig) -> ProviderResult<gemini::Client> {
        let mut builder = gemini::Client::builder().api_key(config.api_key.as_str());
        if !config.endpoint.is_empty() {
            builder = builder.base_url(config.endpoint.as_str());
        }
        builder.build().context(HttpClientSnafu {
            stage: "build-client",
        })
    }

    fn to_rig_message(message: &ProviderMessage) -> Option<RigMessage> {
        match message.role {
            Role::System => None,
            Role::User => Some(RigMessage::user(message.content.clone())),
            Role::Assistant => Some(RigMessage::assistant(message.content.clone())),
        }
    }

    fn merged_preamble(request: &ChatRequest) -> Option<String> {
        let mut preamble_parts = Vec::new();

        if let Some(preamble) = &request.preamble
            && !preamble.trim().is_empty()
        {
            preamble_parts.push(preamble.clone());
        }

        // Rig exposes a single preamble field, so system-role messages are folded into it.
        for message in &request.messages {
            if matches!(message.role, Role::System) && !message.content.trim().is_empty() {
                preamble_parts.push(message.content.clone());
            }
        }

        if preamble_parts.is_empty() {
            None
        } else {
            Some(preamble_parts.join("\n\n"))
        }
    }

    fn completion_builder<M: CompletionModel>(
        model: &M,
        request: &ChatRequest,
        stage: &'static str,
    ) -> ProviderResult<CompletionRequestBuilder<M>> {
        let mut messages = request
            .messages
            .iter()
            .filter_map(Self::to_rig_message)
            .collect::<Vec<_>>();

        let Some(prompt) = messages.pop() else {
            tracing::warn!(
                model_id = %request.model_id,
                total_message_count = request.messages.len(),
                "no user/assistant messages remain after filtering"
            );
            return EmptyMessageSetSnafu { stage }.fail();
        };

        let mut builder = model.completion_request(prompt).messages(messages);

        if let Some(preamble) = Self::merged_preamble(request) {
            builder = builder.preamble(preamble);
        }

        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(max_tokens);
        }

        Ok(builder)
    }

    fn collect_text<'a>(choice: impl Iterator<Item = &'a AssistantContent>) -> String {
        choice
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    fn emit_error_event(event_tx: &mpsc::UnboundedSender<StreamEventPayload>, error: ProviderError) {
        let _ = event_tx.send(StreamEventPayload::Error(error.to_string()));
    }

    fn map_stream_item<R>(item: StreamedAssistantContent<R>) -> Option<StreamEventPayload>
    where
        R: Clone + Unpin,
    {
        match item {
            StreamedAssistantContent::Text(text) if !text.text.is_empty() => {
                Some(StreamEventPayload::Delta(text.text))
            }
            // Reasoning, tool calls and the final usage record carry no reply text.
            _ => None,
        }
    }

    async fn run_stream_worker(
        config: ProviderConfig,
        request: ChatRequest,
        event_tx: mpsc::UnboundedSender<StreamEventPayload>,
        mut cancel_rx: oneshot::Receiver<()>,
    ) {
        let opened = async {
            let client = Self::build_client(&config)?;
            let model = client.completion_model(request.model_id.clone());
            Self::completion_builder(&model, &request, "open-stream-build-request")?
                .stream()
                .await
                .context(CompletionsFailedSnafu {
                    stage: "open-stream",
                })
        };

        let mut stream = match opened.await {
            Ok(stream) => stream,
            Err(error) => {
                tracing::error!(
                    provider_id = %config.provider_id,
                    model_id = %request.model_id,
                    error = %error,
                    "failed to open provider stream"
                );
                Self::emit_error_event(&event_tx, error);
                return;
            }
        };

        let mut cancelled = false;
        let mut stream_failed = false;

        loop {
            tokio::select! {
                _ = &mut cancel_rx => {
                    cancelled = true;
                    tracing::debug!(model_id = %request.model_id, "provider stream cancelled");
                    stream.cancel();
                    break;
                }
                next_item = stream.next() => {
                    match next_item {
                        Some(Ok(item)) => {
                            if let Some(payload) = Self::map_stream_item(item)
                                && event_tx.send(payload).is_err()
                            {
                                return;
                            }
                        }
                        Some(Err(source)) => {
                            stream_failed = true;
                            tracing::warn!(
                                model_id = %request.model_id,
                                error = %source,
                                "provider stream emitted an error chunk"
                            );
                            let error = ProviderError::CompletionsFailed {
                                stage: "stream-chunk",
                                source,
                            };
                            Self::emit_error_event(&event_tx, error);
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        if !cancelled && !stream_failed {
            let _ = event_tx.send(StreamEventPayload::Done);
        }
    }
}

impl LlmProvider for RigProviderAdapter {
    fn id(&self) -> &str {
        &self.config.provider_id
    }

    fn name(&self) -> &str {
        "Rig Gemini"
    }

    fn complete<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            ensure!(
                !request.messages.is_empty(),
                EmptyMessageSetSnafu { stage: "complete" }
            );

            let client = Self::build_client(&self.config)?;
            let model = client.completion_model(request.model_id.clone());
            let response = Self::completion_builder(&model, &request, "complete-build-request")?
                .send()
                .await
                .context(CompletionsFailedSnafu {
                    stage: "complete-send",
                })?;

            Ok(Self::collect_text(response.choice.iter()))
        })
    }

    fn stream_chat(&self, request: ChatRequest) -> ProviderResult<ProviderStreamHandle> {
        ensure!(
            !request.messages.is_empty(),
            EmptyMessageSetSnafu {
                stage: "stream-chat"
            }
        );

        let (event_tx, stream, cancel_rx) = make_event_stream();
        let worker: ProviderWorker = Box::pin(Self::run_stream_worker(
            self.config.clone(),
            request,
            event_tx,
            cancel_rx,
        ));

        Ok(ProviderStreamHandle { stream, worker })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(messages: Vec<ProviderMessage>) -> ChatRequest {
        ChatRequest::new("gemini-3-flash-preview", messages)
    }

    #[test]
    fn adapter_requires_api_key() {
        let result = RigProviderAdapter::new(ProviderConfig::new("gemini", "  ", ""));
        assert!(matches!(result, Err(ProviderError::MissingApiKey { .. })));
    }

    #[test]
    fn system_messages_fold_into_preamble() {
        let request = request(vec![
            ProviderMessage::new(Role::System, "Qisqa javob ber."),
            ProviderMessage::user("Salom"),
        ])
        .with_preamble("Siz kino maslahatchisisiz.");

        assert_eq!(
            RigProviderAdapter::merged_preamble(&request).as_deref(),
            Some("Siz kino maslahatchisisiz.\n\nQisqa javob ber.")
        );
    }

    #[test]
    fn blank_preamble_is_dropped() {
        let request = request(vec![ProviderMessage::user("Salom")]).with_preamble("   ");
        assert_eq!(RigProviderAdapter::merged_preamble(&request), None);
    }

    #[test]
    fn empty_request_is_rejected_before_streaming() {
        let adapter = RigProviderAdapter::new(ProviderConfig::new("gemini", "key", ""))
            .expect("api key present");

        let result = adapter.stream_chat(request(Vec::new()));
        assert!(matches!(result, Err(ProviderError::EmptyMessageSet { .. })));
    }
}
