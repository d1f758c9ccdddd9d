use anyhow::Result;
use chatbot_core::{ChatSession, Config, FileStore, HistoryLog, HttpService, SystemClipboard};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::new(), Some(e)),
    };

    let data_dir = config.data_dir()?;
    let log_path = logging::init(config.log_level(), &data_dir)?;
    tracing::info!(log = %log_path.display(), server = config.server_url(), "starting chatbot");
    match config_error {
        Some(e) => tracing::warn!(error = %e, "could not load config, using defaults"),
        None => write_default_config(&config),
    }

    let store = FileStore::new(config.storage_dir()?);
    let session = ChatSession::new(HistoryLog::new(Box::new(store)));
    let service = HttpService::new(config.server_url());
    let mut app = App::new(session, service, Box::new(SystemClipboard));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    // Initial connection check; the status reads "Checking connection..." until it lands
    handler::spawn_health_check(app.service.clone(), events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!("chatbot exited");
    result
}

/// Write the defaults out on first run so there is a file to edit.
fn write_default_config(config: &Config) {
    let exists = Config::get_config_path().map(|p| p.exists()).unwrap_or(true);
    if !exists {
        if let Err(e) = config.save() {
            tracing::warn!(error = %e, "could not write default config");
        }
    }
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let tx = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &tx)?,
            None => break,
        }
    }

    Ok(())
}
