//! Scripted backend and recording host shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use kinochi_llm::{
    BoxFuture, ChatRequest, LlmProvider, ProviderError, ProviderResult, ProviderStreamHandle,
    ProviderWorker, StreamEventPayload, make_event_stream,
};

use crate::host::{HapticImpact, HapticNotification, HostBridge};

#[derive(Debug, Clone)]
pub(crate) enum ScriptStep {
    Fragment(&'static str),
    Fail(&'static str),
    /// Drops the sender without a terminal event.
    Close,
}

#[derive(Debug, Clone)]
pub(crate) enum Script {
    Stream(Vec<ScriptStep>),
    Reply(Result<&'static str, &'static str>),
    RejectStream,
}

/// Backend double that replays one script per call and records every request.
pub(crate) struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_script(&self, request: ChatRequest) -> Script {
        self.requests.lock().unwrap().push(request);
        self.scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Stream(Vec::new()))
    }
}

fn scripted_failure(details: &str) -> ProviderError {
    ProviderError::UnsupportedProvider {
        stage: "scripted-failure",
        provider_id: details.to_string(),
    }
}

impl LlmProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn complete<'a>(&'a self, request: ChatRequest) -> BoxFuture<'a, ProviderResult<String>> {
        let script = self.next_script(request);
        Box::pin(async move {
            match script {
                Script::Reply(Ok(text)) => Ok(text.to_string()),
                Script::Reply(Err(details)) => Err(scripted_failure(details)),
                Script::Stream(_) | Script::RejectStream => Err(scripted_failure("no reply scripted")),
            }
        })
    }

    fn stream_chat(&self, request: ChatRequest) -> ProviderResult<ProviderStreamHandle> {
        let steps = match self.next_script(request) {
            Script::Stream(steps) => steps,
            Script::RejectStream => return Err(scripted_failure("stream rejected")),
            Script::Reply(_) => Vec::new(),
        };

        let (event_tx, stream, _cancel_rx) = make_event_stream();
        let worker: ProviderWorker = Box::pin(async move {
            for step in steps {
                match step {
                    ScriptStep::Fragment(text) => {
                        if event_tx
                            .send(StreamEventPayload::Delta(text.to_string()))
                            .is_err()
                        {
                            return;
                        }
                    }
                    ScriptStep::Fail(details) => {
                        let _ = event_tx.send(StreamEventPayload::Error(details.to_string()));
                        return;
                    }
                    ScriptStep::Close => return,
                }
            }
            let _ = event_tx.send(StreamEventPayload::Done);
        });

        Ok(ProviderStreamHandle { stream, worker })
    }
}

/// Host double; `calls` keeps the handshake requests in order.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) impacts: Mutex<Vec<HapticImpact>>,
    pub(crate) notifications: Mutex<Vec<HapticNotification>>,
}

impl HostBridge for RecordingHost {
    fn ready(&self) {
        self.calls.lock().unwrap().push("ready".to_string());
    }

    fn expand(&self) {
        self.calls.lock().unwrap().push("expand".to_string());
    }

    fn set_header_color(&self, color: &str) {
        self.calls.lock().unwrap().push(format!("header:{color}"));
    }

    fn set_background_color(&self, color: &str) {
        self.calls.lock().unwrap().push(format!("background:{color}"));
    }

    fn impact_occurred(&self, impact: HapticImpact) {
        self.impacts.lock().unwrap().push(impact);
    }

    fn notification_occurred(&self, notification: HapticNotification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
