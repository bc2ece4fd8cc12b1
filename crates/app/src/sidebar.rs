use gpui::*;
use gpui_component::{
    ActiveTheme, Icon, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};
use kinochi_chat::NewConversation;
use kinochi_chat::prompts::ASSISTANT_NAME;

pub const APP_VERSION_LABEL: &str = "AI-Kinochi v2.5.0";
pub const CHANNEL_URL: &str = "https://t.me/UZHD_Kinolari";

const NEW_CHAT_LABEL: &str = "Yangi suhbat";
const SECTION_MAIN: &str = "Asosiy";
const SECTION_BOT: &str = "Telegram Bot";
const SECTION_RESOURCES: &str = "Resurslar";
const BOT_STATUS_LABEL: &str = "Bot holati";
const CHANNEL_BUTTON_LABEL: &str = "Telegram-ga o'tish";
const FOOTER_NOTE: &str = "© 2024 UZHD Ecosystem";

/// Asks the shell to move focus into the message composer.
#[derive(Debug, Clone, Copy)]
pub struct SearchMovies;

/// Entries of the "Resurslar" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarResource {
    MovieSearch,
    Channel,
}

impl SidebarResource {
    pub const ALL: [Self; 2] = [Self::MovieSearch, Self::Channel];

    pub fn label(self) -> &'static str {
        match self {
            Self::MovieSearch => "Filmlar qidiruvi",
            Self::Channel => "UZHD Kanal",
        }
    }

    /// External link opened on click; in-app entries have none.
    pub fn url(self) -> Option<&'static str> {
        match self {
            Self::MovieSearch => None,
            Self::Channel => Some(CHANNEL_URL),
        }
    }

    fn icon(self) -> IconName {
        match self {
            Self::MovieSearch => IconName::Search,
            Self::Channel => IconName::ExternalLink,
        }
    }
}

/// Connection state shown in the bot status card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotStatus {
    Online { model_id: String },
    Unavailable,
}

impl BotStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Online { .. } => "ONLINE",
            Self::Unavailable => "OFFLINE",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Online { model_id } => format!("Model: {model_id}"),
            Self::Unavailable => "Sozlamalarni tekshiring".to_string(),
        }
    }
}

pub struct KinochiSidebar {
    status: BotStatus,
}

impl EventEmitter<NewConversation> for KinochiSidebar {}
impl EventEmitter<SearchMovies> for KinochiSidebar {}

impl KinochiSidebar {
    pub fn new(status: BotStatus) -> Self {
        Self { status }
    }

    pub fn set_status(&mut self, status: BotStatus, cx: &mut Context<Self>) {
        if self.status != status {
            self.status = status;
            cx.notify();
        }
    }

    fn section_title(title: &'static str, cx: &Context<Self>) -> impl IntoElement {
        Label::new(title)
            .text_xs()
            .px_3()
            .pb_2()
            .text_color(cx.theme().muted_foreground)
    }

    fn render_brand(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("sidebar-brand")
            .gap_3()
            .p_4()
            .items_center()
            .border_b_1()
            .border_color(theme.border)
            .child(
                div()
                    .p_2()
                    .rounded_lg()
                    .bg(theme.danger)
                    .child(Icon::new(IconName::Star).size(px(16.)).text_color(theme.danger_foreground)),
            )
            .child(Label::new(ASSISTANT_NAME).text_lg())
    }

    fn render_resource(&self, resource: SidebarResource, cx: &Context<Self>) -> impl IntoElement {
        Button::new(("sidebar-resource", resource as usize))
            .ghost()
            .w_full()
            .justify_start()
            .icon(resource.icon())
            .child(resource.label())
            .on_click(cx.listener(move |_, _, _window, cx| match resource.url() {
                Some(url) => cx.open_url(url),
                None => cx.emit(SearchMovies),
            }))
    }

    fn render_status_card(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let status_color = match self.status {
            BotStatus::Online { .. } => theme.success,
            BotStatus::Unavailable => theme.danger,
        };

        v_flex()
            .id("sidebar-status-card")
            .mx_1()
            .p_3()
            .gap_2()
            .rounded_lg()
            .border_1()
            .border_color(theme.border)
            .bg(theme.muted)
            .child(
                h_flex()
                    .justify_between()
                    .items_center()
                    .child(
                        Label::new(BOT_STATUS_LABEL)
                            .text_xs()
                            .text_color(theme.muted_foreground),
                    )
                    .child(
                        h_flex()
                            .gap_1()
                            .items_center()
                            .child(div().size(px(6.)).rounded_full().bg(status_color))
                            .child(Label::new(self.status.label()).text_xs().text_color(status_color)),
                    ),
            )
            .child(
                Label::new(self.status.detail())
                    .text_xs()
                    .text_color(theme.muted_foreground),
            )
            .child(
                Button::new("sidebar-open-channel")
                    .primary()
                    .small()
                    .w_full()
                    .icon(IconName::ExternalLink)
                    .child(CHANNEL_BUTTON_LABEL)
                    .on_click(|_, _window, cx| {
                        cx.open_url(CHANNEL_URL);
                    }),
            )
    }

    fn render_footer(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("sidebar-footer")
            .p_4()
            .gap_1()
            .border_t_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(Icon::new(IconName::Info).size(px(12.)).text_color(theme.muted_foreground))
                    .child(
                        Label::new(APP_VERSION_LABEL)
                            .text_xs()
                            .text_color(theme.muted_foreground),
                    ),
            )
            .child(
                Label::new(FOOTER_NOTE)
                    .text_xs()
                    .text_color(theme.muted_foreground),
            )
    }
}

impl Render for KinochiSidebar {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        v_flex()
            .id("kinochi-sidebar")
            .size_full()
            .child(self.render_brand(cx))
            .child(
                v_flex()
                    .id("sidebar-nav")
                    .flex_1()
                    .min_h_0()
                    .p_3()
                    .gap_1()
                    .overflow_y_scroll()
                    .child(Self::section_title(SECTION_MAIN, cx))
                    .child(
                        Button::new("sidebar-new-chat")
                            .ghost()
                            .w_full()
                            .justify_start()
                            .icon(IconName::Plus)
                            .child(NEW_CHAT_LABEL)
                            .on_click(cx.listener(|_, _, _window, cx| {
                                cx.emit(NewConversation);
                            })),
                    )
                    .child(div().pt_4().child(Self::section_title(SECTION_BOT, cx)))
                    .child(self.render_status_card(cx))
                    .child(div().pt_4().child(Self::section_title(SECTION_RESOURCES, cx)))
                    .children(
                        SidebarResource::ALL
                            .into_iter()
                            .map(|resource| self.render_resource(resource, cx)),
                    ),
            )
            .child(self.render_footer(cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_card_texts() {
        let online = BotStatus::Online {
            model_id: "gemini-3-flash-preview".to_string(),
        };
        assert_eq!(online.label(), "ONLINE");
        assert_eq!(online.detail(), "Model: gemini-3-flash-preview");
        assert_eq!(BotStatus::Unavailable.label(), "OFFLINE");
    }

    #[test]
    fn only_channel_resource_leaves_the_app() {
        let links = SidebarResource::ALL
            .into_iter()
            .map(|resource| (resource.label(), resource.url()))
            .collect::<Vec<_>>();

        assert_eq!(
            links,
            vec![
                ("Filmlar qidiruvi", None),
                ("UZHD Kanal", Some("https://t.me/UZHD_Kinolari")),
            ]
        );
    }
}
