use std::sync::Arc;

use gpui::*;
use gpui_component::{Root, Theme, ThemeMode};
use tracing_subscriber::EnvFilter;

use kinochi::app::{KinochiShell, NewChat, Quit, ToggleSidebar};
use kinochi_chat::{ChatSettings, HostBridge, HostTheme, TracingHost, initialize_host};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads settings and refuses to start without a usable API key.
fn load_settings() -> Option<ChatSettings> {
    let settings = match ChatSettings::load() {
        Ok(settings) => settings,
        Err(error) => {
            tracing::error!(error = %error, "failed to load settings");
            return None;
        }
    };

    if let Err(error) = settings.to_provider_config() {
        tracing::error!(
            error = %error,
            config_path = %ChatSettings::default_config_path().display(),
            "chat backend is not configured"
        );
        return None;
    }

    Some(settings)
}

fn main() {
    init_tracing();

    let Some(settings) = load_settings() else {
        std::process::exit(1);
    };

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(move |cx| {
        gpui_tokio_bridge::init(cx);
        gpui_component::init(cx);
        Theme::change(ThemeMode::Dark, None, cx);

        let host: Arc<dyn HostBridge> = Arc::new(TracingHost);
        initialize_host(host.as_ref(), &HostTheme::KINOCHI);

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });

        cx.bind_keys([
            KeyBinding::new("cmd-q", Quit, None),
            KeyBinding::new("cmd-n", NewChat, None),
            KeyBinding::new("cmd-b", ToggleSidebar, None),
        ]);

        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(1100.), px(760.)),
                        cx,
                    ))),
                    titlebar: Some(TitlebarOptions {
                        title: Some("AI-Kinochi".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                };

                let opened = cx.open_window(options, |window, cx| {
                    let shell =
                        cx.new(|cx| KinochiShell::new(settings, host.clone(), window, cx));
                    cx.new(|cx| Root::new(shell, window, cx))
                });

                match opened {
                    Ok(_) => cx.activate(true),
                    Err(error) => {
                        tracing::error!(error = %error, "failed to open main window");
                        cx.quit();
                    }
                }
            })
        })
        .detach();
    });
}
