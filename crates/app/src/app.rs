use std::sync::Arc;

use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};
use kinochi_chat::{ChatSettings, HostBridge, NewConversation, SettingsSessionFactory};

use crate::chat::{ChatView, SessionChanged};
use crate::sidebar::{KinochiSidebar, SearchMovies};

pub const SIDEBAR_WIDTH: Pixels = px(288.);
pub const SIDEBAR_RAIL_WIDTH: Pixels = px(52.);

gpui::actions!(kinochi, [NewChat, ToggleSidebar, Quit]);

/// Width the sidebar container takes for the given collapse state.
pub fn sidebar_width(collapsed: bool) -> Pixels {
    if collapsed {
        SIDEBAR_RAIL_WIDTH
    } else {
        SIDEBAR_WIDTH
    }
}

/// Root layout: sidebar next to the chat area.
pub struct KinochiShell {
    chat_view: Entity<ChatView>,
    sidebar: Entity<KinochiSidebar>,
    sidebar_collapsed: bool,
}

impl KinochiShell {
    pub fn new(
        settings: ChatSettings,
        host: Arc<dyn HostBridge>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let session_factory = Arc::new(SettingsSessionFactory::new(settings));
        let chat_view = cx.new(|cx| ChatView::new(session_factory, host, window, cx));
        let status = chat_view.read(cx).bot_status();
        let sidebar = cx.new(|_| KinochiSidebar::new(status));

        cx.subscribe(&sidebar, |this, _, _: &NewConversation, cx| {
            this.new_chat(cx);
        })
        .detach();

        cx.subscribe_in(&sidebar, window, |this, _, _: &SearchMovies, window, cx| {
            this.chat_view
                .update(cx, |chat_view, cx| chat_view.focus_input(window, cx));
        })
        .detach();

        cx.subscribe(&chat_view, |this, chat_view, _: &SessionChanged, cx| {
            let status = chat_view.read(cx).bot_status();
            this.sidebar
                .update(cx, |sidebar, cx| sidebar.set_status(status, cx));
        })
        .detach();

        Self {
            chat_view,
            sidebar,
            sidebar_collapsed: false,
        }
    }

    fn toggle_sidebar(&mut self, cx: &mut Context<Self>) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        tracing::debug!(collapsed = self.sidebar_collapsed, "sidebar toggled");
        cx.notify();
    }

    fn new_chat(&mut self, cx: &mut Context<Self>) {
        self.chat_view
            .update(cx, |chat_view, cx| chat_view.reset_conversation(cx));
    }

    fn toggle_button(&self, cx: &Context<Self>) -> Button {
        let icon = if self.sidebar_collapsed {
            IconName::PanelLeftOpen
        } else {
            IconName::PanelLeftClose
        };

        Button::new("sidebar-toggle")
            .ghost()
            .small()
            .icon(icon)
            .on_click(cx.listener(|this, _, _window, cx| {
                this.toggle_sidebar(cx);
            }))
    }

    /// Icon rail shown while the sidebar is collapsed.
    fn render_rail(&self, cx: &Context<Self>) -> AnyElement {
        v_flex()
            .id("sidebar-rail")
            .size_full()
            .items_center()
            .py_3()
            .gap_2()
            .child(self.toggle_button(cx))
            .child(
                Button::new("rail-new-chat")
                    .ghost()
                    .small()
                    .icon(IconName::Plus)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.new_chat(cx);
                    })),
            )
            .into_any_element()
    }

    fn render_sidebar(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let collapsed = self.sidebar_collapsed;

        v_flex()
            .id("sidebar-container")
            .h_full()
            .flex_shrink_0()
            .w(sidebar_width(collapsed))
            .overflow_hidden()
            .bg(theme.sidebar)
            .border_r_1()
            .border_color(theme.border)
            .map(|container| {
                if collapsed {
                    container.child(self.render_rail(cx))
                } else {
                    container
                        .child(div().flex_1().min_h_0().child(self.sidebar.clone()))
                        .child(h_flex().px_2().pb_2().child(self.toggle_button(cx)))
                }
            })
    }
}

impl Render for KinochiShell {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("kinochi-shell")
            .size_full()
            .bg(theme.background)
            .text_color(theme.foreground)
            .on_action(cx.listener(|this, _: &NewChat, _window, cx| {
                this.new_chat(cx);
            }))
            .on_action(cx.listener(|this, _: &ToggleSidebar, _window, cx| {
                this.toggle_sidebar(cx);
            }))
            .child(self.render_sidebar(cx))
            .child(
                div()
                    .id("main-content")
                    .flex_1()
                    .h_full()
                    .min_w_0()
                    .overflow_hidden()
                    .child(self.chat_view.clone()),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_sidebar_shrinks_to_rail() {
        assert_eq!(sidebar_width(false), SIDEBAR_WIDTH);
        assert_eq!(sidebar_width(true), SIDEBAR_RAIL_WIDTH);
        assert!(SIDEBAR_RAIL_WIDTH < SIDEBAR_WIDTH);
    }
}
