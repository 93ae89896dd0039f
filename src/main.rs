use std::sync::Arc;

use anyhow::Result;
use bubblechat_core::{ChatClient, ChatSession, Config, VoiceClient};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is best effort; the app runs fine without it
    if let Ok(path) = logging::init() {
        tracing::info!(log = %path.display(), "bubblechat starting");
    }

    let config = Config::load()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load config, using defaults");
            Config::new()
        })
        .with_env();
    tracing::info!(
        chat_url = config.chat_url(),
        voice_url = config.voice_url(),
        "backends configured"
    );

    let chat_client = ChatClient::new(config.chat_url(), &config.health_url());
    let voice_client = VoiceClient::new(config.voice_url());
    let session = ChatSession::with_greeting(config.initial_model());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(
        session,
        Arc::new(chat_client.clone()),
        Arc::new(voice_client),
        events.sender(),
    );

    // Probe the backend once so the header can show whether it's reachable
    let tx = events.sender();
    tokio::spawn(async move {
        let online = match chat_client.health().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, url = chat_client.chat_url(), "chat backend health check failed");
                false
            }
        };
        let _ = tx.send(AppEvent::Health(online));
    });

    let result = run(&mut terminal, &mut app, &mut events).await;

    app.shutdown();
    tui::restore()?;
    tracing::info!("bubblechat exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
