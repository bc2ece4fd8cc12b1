use std::sync::Arc;

use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex};
use gpui_tokio_bridge::Tokio;
use kinochi_chat::prompts::ASSISTANT_NAME;
use kinochi_chat::{
    ConversationController, HostBridge, SessionFactory, SessionStream, StreamEvent, StreamTarget,
    StreamTurn, Submit,
};

use crate::chat::{MessageInput, MessageList, MessageRow};
use crate::sidebar::BotStatus;

const HEADER_SUBTITLE: &str = "Rasmiy bot interfeysi";

/// Emitted after the active session was replaced.
#[derive(Debug, Clone, Copy)]
pub struct SessionChanged;

/// Status card contents for the current session.
pub fn bot_status(controller: &ConversationController) -> BotStatus {
    match controller.session() {
        Some(session) => BotStatus::Online {
            model_id: session.profile().model.id.clone(),
        },
        None => BotStatus::Unavailable,
    }
}

/// Coordinator between the conversation controller and the list/input views.
pub struct ChatView {
    controller: ConversationController,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    stream_worker_task: Option<Task<Result<(), gpui_tokio_bridge::JoinError>>>,
    stream_reader_task: Option<Task<()>>,
}

impl EventEmitter<SessionChanged> for ChatView {}

impl ChatView {
    pub fn new(
        session_factory: Arc<dyn SessionFactory>,
        host: Arc<dyn HostBridge>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));

        cx.subscribe_in(&message_input, window, |this, _, event: &Submit, window, cx| {
            this.handle_submit(event, window, cx);
        })
        .detach();

        let mut this = Self {
            controller: ConversationController::new(session_factory, host),
            message_list,
            message_input,
            stream_worker_task: None,
            stream_reader_task: None,
        };
        this.sync_views(cx);
        this
    }

    pub fn bot_status(&self) -> BotStatus {
        bot_status(&self.controller)
    }

    /// Abandons any in-flight reply and starts over with the greeting.
    pub fn reset_conversation(&mut self, cx: &mut Context<Self>) {
        // Dropping the reader drops the event stream, which cancels the worker.
        self.stream_reader_task = None;
        self.stream_worker_task = None;

        self.controller.reset();
        tracing::info!(
            conversation_id = self.controller.conversation_id().0,
            "started new conversation"
        );

        self.sync_views(cx);
        cx.emit(SessionChanged);
        cx.notify();
    }

    pub fn focus_input(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.message_input
            .update(cx, |input, cx| input.focus(window, cx));
    }

    fn handle_submit(&mut self, event: &Submit, window: &mut Window, cx: &mut Context<Self>) {
        self.controller.set_input(event.content.clone());
        let turn = self.controller.submit_input();

        // A rejected submit leaves the buffer, and the typed text, in place.
        if self.controller.input().is_empty() {
            self.message_input
                .update(cx, |input, cx| input.clear(window, cx));
        }
        self.sync_views(cx);

        if let Some(turn) = turn {
            self.spawn_stream_pipeline(turn, cx);
        }
    }

    fn spawn_stream_pipeline(&mut self, turn: StreamTurn, cx: &mut Context<Self>) {
        let StreamTurn {
            target,
            stream,
            worker,
        } = turn;

        self.stream_worker_task = Some(Tokio::spawn(cx, worker));
        self.spawn_stream_reader(target, stream, cx);
    }

    fn spawn_stream_reader(
        &mut self,
        target: StreamTarget,
        mut stream: SessionStream,
        cx: &mut Context<Self>,
    ) {
        self.stream_reader_task = Some(cx.spawn(async move |this, cx| {
            while let Some(payload) = stream.next().await {
                let _ = this.update(cx, |this, cx| {
                    this.handle_stream_event(StreamEvent::new(target, payload), cx);
                });
            }

            let _ = this.update(cx, |this, _cx| {
                this.handle_stream_reader_closed(target);
            });
        }));
    }

    fn handle_stream_event(&mut self, event: StreamEvent, cx: &mut Context<Self>) {
        if self.controller.apply_stream_event(event) {
            self.sync_views(cx);
        }
    }

    fn handle_stream_reader_closed(&mut self, target: StreamTarget) {
        // A newer turn may already own the task slots.
        if self.controller.active_target().is_some_and(|active| active != target) {
            return;
        }

        self.stream_worker_task = None;
        self.stream_reader_task = None;
    }

    fn sync_views(&mut self, cx: &mut Context<Self>) {
        let rows = MessageRow::collect(&self.controller);
        let is_loading = self.controller.is_loading();

        self.message_list.update(cx, |list, cx| list.set_rows(rows, cx));
        self.message_input
            .update(cx, |input, cx| input.set_loading(is_loading, cx));
    }

    fn render_header(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("chat-view-header")
            .w_full()
            .h(px(56.))
            .flex_shrink_0()
            .px_6()
            .items_center()
            .border_b_1()
            .border_color(theme.border)
            .child(
                v_flex()
                    .child(
                        h_flex()
                            .gap_2()
                            .items_center()
                            .child(Label::new(ASSISTANT_NAME).text_sm())
                            .child(
                                div()
                                    .px_1()
                                    .rounded_sm()
                                    .bg(theme.danger)
                                    .text_color(theme.danger_foreground)
                                    .text_xs()
                                    .child("UZHD"),
                            ),
                    )
                    .child(
                        Label::new(HEADER_SUBTITLE)
                            .text_xs()
                            .text_color(theme.muted_foreground),
                    ),
            )
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-view")
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(self.render_header(cx))
            .child(
                div()
                    .id("chat-view-message-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .child(self.message_input.clone()),
            )
    }
}

#[cfg(test)]
mod tests {
    use kinochi_chat::{
        ChatSession, ChatSettings, NoopHost, Role, SessionResult, SettingsSessionFactory,
    };

    use super::*;

    #[test]
    fn status_is_unavailable_without_session() {
        let factory = SettingsSessionFactory::new(ChatSettings::default());
        let controller = ConversationController::new(Arc::new(factory), Arc::new(NoopHost));

        assert_eq!(bot_status(&controller), BotStatus::Unavailable);
    }

    #[test]
    fn status_reports_configured_model() {
        let factory = || -> SessionResult<ChatSession> {
            ChatSession::new(&ChatSettings {
                api_key: "test-key".to_string(),
                model: "gemini-2.5-pro".to_string(),
                ..ChatSettings::default()
            })
        };
        let controller = ConversationController::new(Arc::new(factory), Arc::new(NoopHost));

        assert_eq!(
            bot_status(&controller),
            BotStatus::Online {
                model_id: "gemini-2.5-pro".to_string(),
            }
        );
    }

    #[test]
    fn rows_mark_only_the_streaming_placeholder() {
        let factory = || -> SessionResult<ChatSession> {
            ChatSession::new(&ChatSettings {
                api_key: "test-key".to_string(),
                ..ChatSettings::default()
            })
        };
        let mut controller = ConversationController::new(Arc::new(factory), Arc::new(NoopHost));
        let turn = controller.submit("Komediya");
        assert!(turn.is_some());

        let rows = MessageRow::collect(&controller);
        let flags = rows
            .iter()
            .map(|row| (row.message.role, row.working))
            .collect::<Vec<_>>();

        assert_eq!(
            flags,
            vec![(Role::Model, false), (Role::User, false), (Role::Model, true)]
        );
    }
}
