use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, Icon, IconName, h_flex, label::Label, text::TextView, v_flex};
use kinochi_chat::{ConversationController, Message, Role};

const CONTENT_MAX_WIDTH: Pixels = px(760.);
const BUBBLE_MAX_WIDTH: Pixels = px(560.);
const AVATAR_SIZE: Pixels = px(36.);
const USER_AVATAR_TEXT: &str = "SM";

/// One rendered entry; `working` marks the streaming placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub message: Message,
    pub working: bool,
}

impl MessageRow {
    pub fn collect(controller: &ConversationController) -> Vec<Self> {
        controller
            .messages()
            .iter()
            .map(|message| Self {
                working: controller.is_working_placeholder(message),
                message: message.clone(),
            })
            .collect()
    }
}

pub struct MessageList {
    rows: Vec<MessageRow>,
    scroll_handle: ScrollHandle,
    pending_scroll: bool,
    last_max_offset: Pixels,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            rows: Vec::new(),
            scroll_handle: ScrollHandle::new(),
            pending_scroll: true,
            last_max_offset: Pixels::ZERO,
        }
    }

    pub fn set_rows(&mut self, rows: Vec<MessageRow>, cx: &mut Context<Self>) {
        if rows != self.rows {
            self.rows = rows;
            self.pending_scroll = true;
            cx.notify();
        }
    }

    /// Keeps the newest message in view whenever rows or content height change.
    fn scroll_to_tail(&mut self) {
        let max_offset = self.scroll_handle.max_offset().height;
        if !self.pending_scroll && max_offset == self.last_max_offset {
            return;
        }

        self.pending_scroll = false;
        self.last_max_offset = max_offset;

        // gpui scrolls with negative offsets; the tail sits at -max_offset.
        let current_x = self.scroll_handle.offset().x;
        self.scroll_handle.set_offset(point(current_x, -max_offset));
    }

    fn render_row(&self, index: usize, row: &MessageRow, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let message = &row.message;
        let is_user = message.role == Role::User;

        let avatar = div()
            .flex_shrink_0()
            .size(AVATAR_SIZE)
            .rounded_lg()
            .flex()
            .items_center()
            .justify_center()
            .text_xs()
            .text_color(theme.primary_foreground)
            .map(|avatar| {
                if is_user {
                    avatar.bg(theme.primary).child(USER_AVATAR_TEXT)
                } else {
                    avatar.bg(theme.danger).child(
                        Icon::new(IconName::Bot)
                            .size(px(18.))
                            .text_color(theme.danger_foreground),
                    )
                }
            });

        let body: AnyElement = if row.working {
            h_flex()
                .gap_1()
                .py_2()
                .children((0..3).map(|_| div().size(px(8.)).rounded_full().bg(theme.danger)))
                .into_any_element()
        } else if is_user {
            Label::new(message.text.clone()).text_sm().into_any_element()
        } else {
            let markdown_id = ElementId::Name(SharedString::from(format!(
                "model-markdown-{}-{index}",
                message.id.0
            )));
            TextView::markdown(markdown_id, message.text.clone())
                .selectable(true)
                .into_any_element()
        };

        let bubble = div()
            .max_w(BUBBLE_MAX_WIDTH)
            .px_4()
            .py_3()
            .rounded_xl()
            .map(|bubble| {
                if is_user {
                    bubble.bg(theme.primary).text_color(theme.primary_foreground)
                } else {
                    bubble
                        .bg(theme.secondary)
                        .text_color(theme.foreground)
                        .border_1()
                        .border_color(theme.border)
                }
            })
            .child(body);

        let column = v_flex()
            .gap_1()
            .when(is_user, |column| column.items_end())
            .when(!is_user, |column| column.items_start())
            .child(bubble)
            .child(
                Label::new(message.time_label())
                    .text_xs()
                    .text_color(theme.muted_foreground),
            );

        h_flex()
            .id(("message-row", index))
            .w_full()
            .gap_3()
            .items_start()
            .when(is_user, |row| row.flex_row_reverse())
            .child(avatar)
            .child(column)
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.scroll_to_tail();

        let rows = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.render_row(index, row, cx))
            .collect::<Vec<_>>();

        div()
            .id("message-list")
            .size_full()
            .min_h_0()
            .overflow_y_scroll()
            .track_scroll(&self.scroll_handle)
            .child(
                v_flex()
                    .w_full()
                    .max_w(CONTENT_MAX_WIDTH)
                    .mx_auto()
                    .px_4()
                    .py_6()
                    .gap_6()
                    .children(rows),
            )
    }
}
