use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
    label::Label,
    v_flex,
};
use kinochi_chat::Submit;

const INPUT_PLACEHOLDER: &str = "Savolingizni yozing...";
const POWERED_BY: &str = "Powered by Gemini 3 Flash & UZHD AI";

/// Single-line prompt field with a send button.
pub struct MessageInput {
    input_state: Entity<InputState>,
    is_loading: bool,
}

impl EventEmitter<Submit> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| InputState::new(window, cx).placeholder(INPUT_PLACEHOLDER));

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| match event {
                InputEvent::PressEnter { .. } => this.handle_submit(window, cx),
                _ => cx.notify(),
            },
        )
        .detach();

        Self {
            input_state,
            is_loading: false,
        }
    }

    pub fn set_loading(&mut self, loading: bool, cx: &mut Context<Self>) {
        if self.is_loading != loading {
            self.is_loading = loading;
            cx.notify();
        }
    }

    pub fn clear(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
    }

    pub fn focus(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state
            .update(cx, |state, cx| state.focus(window, cx));
    }

    fn can_send(&self, cx: &App) -> bool {
        let value = self.input_state.read(cx).value();
        can_send(&value, self.is_loading)
    }

    fn handle_submit(&mut self, _window: &mut Window, cx: &mut Context<Self>) {
        if !self.can_send(cx) {
            return;
        }

        let content = self.input_state.read(cx).value().to_string();
        // The chat view clears the field once the turn is accepted.
        cx.emit(Submit::new(content));
    }
}

/// Send is enabled only for non-blank text while no reply is streaming.
pub fn can_send(text: &str, is_loading: bool) -> bool {
    !is_loading && !text.trim().is_empty()
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let is_loading = self.is_loading;
        let send_enabled = self.can_send(cx);

        v_flex()
            .bg(theme.background)
            .gap_2()
            .p_4()
            .child(
                h_flex()
                    .w_full()
                    .gap_2()
                    .px_3()
                    .py_2()
                    .items_center()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.secondary)
                    .child(
                        div().flex_1().min_w_0().child(
                            Input::new(&self.input_state).disabled(is_loading),
                        ),
                    )
                    .child(
                        Button::new("send")
                            .ghost()
                            .small()
                            .icon(IconName::ArrowUp)
                            .disabled(!send_enabled)
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.handle_submit(window, cx);
                            })),
                    ),
            )
            .child(
                h_flex().w_full().justify_center().child(
                    Label::new(POWERED_BY)
                        .text_xs()
                        .text_color(theme.muted_foreground),
                ),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::can_send;

    #[test]
    fn send_requires_text_and_idle_state() {
        assert!(can_send("Komediya", false));
        assert!(!can_send("   ", false));
        assert!(!can_send("", false));
        assert!(!can_send("Komediya", true));
    }
}
