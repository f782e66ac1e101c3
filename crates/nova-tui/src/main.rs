mod app;
mod handler;
mod palette;
mod tui;
mod ui;
mod wrap;

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nova_core::config::env_credential;
use nova_core::{
    CommandSpeech, Config, Conversation, FileStore, GeminiClient, PreferenceStore, SilentSpeech,
    SpeechEngine, UuidGenerator,
};

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "nova")]
#[command(about = "Terminal chat with Google Gemini, with replies read aloud", long_about = None)]
struct Cli {
    /// Directory for saved settings (default: <config dir>/nova)
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Gemini model to talk to
    #[arg(long, short)]
    model: Option<String>,

    /// API base URL, e.g. for a proxy
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Never read replies aloud
    #[arg(long)]
    mute: bool,

    /// Log file (default: <data dir>/nova.log). Filter with RUST_LOG.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir, cli.log_file, cli.endpoint, cli.model, cli.mute)?;

    // The terminal belongs to the UI, so logs go to a file
    let log_file = open_log_file(&config.log_file)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    log::info!("starting nova with model {}", config.model);

    let preferences = PreferenceStore::open(Box::new(FileStore::new(&config.data_dir)));
    let speech: Box<dyn SpeechEngine> = if config.mute {
        Box::new(SilentSpeech)
    } else {
        Box::new(CommandSpeech::detect())
    };
    let client = Arc::new(GeminiClient::new(Some(config.endpoint.clone()), Some(config.model.clone())));
    let conversation = Conversation::new(client, speech, Box::new(UuidGenerator));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(
        conversation,
        preferences,
        env_credential(),
        events.sender(),
        config.model,
    );

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
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

/// Open the log for appending, creating it and its directory if needed.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file {}", path.display()))
}
