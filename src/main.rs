use devdash::adapters::{CommandVoice, GitHubClient, ModelsAssistant, SqliteCache};
use devdash::app::{self, App, AppMessage};
use devdash::config::{self, AppConfig};
use devdash::hardware::Board;
use devdash::logging;
use devdash::screens::Services;
use devdash::system::spawn_stats_poller;
use devdash::terminal::{setup_panic_hook, TerminalManager};

use color_eyre::Result;
use crossterm::event::EventStream;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const STATS_PERIOD: Duration = Duration::from_secs(5);

/// `--config <path>`, if given.
fn config_arg() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

fn build_services(config: AppConfig) -> Result<Services> {
    let cache = SqliteCache::open(&config.database_path())?;
    let code_host = GitHubClient::new(&config.github)?;
    let assistant = ModelsAssistant::new(&config)?;
    let voice = CommandVoice::new(&config.voice);
    let board = Board::from_config(&config.gpio);

    Ok(Services {
        config: Arc::new(config),
        cache: Arc::new(cache),
        code_host: Arc::new(code_host),
        assistant: Arc::new(assistant),
        peripherals: Arc::new(board),
        voice: Arc::new(voice),
    })
}

/// Post [`AppMessage::Shutdown`] on Ctrl-C or SIGTERM.
fn spawn_signal_watcher(tx: mpsc::UnboundedSender<AppMessage>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "SIGTERM handler unavailable");
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::info!("termination signal received");
        let _ = tx.send(AppMessage::Shutdown);
    });
}

fn main() -> Result<()> {
    // Handle --version flag before any initialization
    if std::env::args().any(|arg| arg == "--version") {
        println!("devdash {}", VERSION);
        std::process::exit(0);
    }

    color_eyre::install()?;

    // Setup panic hook to ensure terminal cleanup on panic
    setup_panic_hook();

    let config = AppConfig::load(config_arg().as_deref())?;
    let log_path = logging::init(&config::data_dir())?;

    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async move {
        let services = build_services(config)?;
        let mut app = App::new(services, Instant::now());

        spawn_stats_poller(app.sender(), STATS_PERIOD);
        spawn_signal_watcher(app.sender());

        let mut terminal = TerminalManager::new()?;
        let result = app::run(&mut app, &mut terminal, EventStream::new()).await;
        terminal.restore()?;

        if let Err(err) = &result {
            tracing::error!(error = %err, "dashboard stopped");
            eprintln!("devdash stopped: {err}");
            eprintln!("Log: {}", log_path.display());
        }
        result?;
        Ok::<(), color_eyre::Report>(())
    })
}
