use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use indra_monitor::config::{RuntimeConfig, Settings};
use indra_monitor::ui::{self, Theme};
use indra_monitor::{events, Actions, ApiClient, App, HealthTracker, Poller, SyncClient, SystemStore};

#[derive(Parser, Debug)]
#[command(name = "indra-monitor")]
#[command(about = "Terminal dashboard for the IndraOS monitoring API")]
struct Args {
    /// Path to a TOML config file (default: ./indra-monitor.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Live metrics WebSocket URL
    #[arg(short, long)]
    url: Option<String>,

    /// REST API base URL
    #[arg(short, long)]
    api: Option<String>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set (e.g. "debug", "indra_monitor=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Do not connect to the live stream on startup
    #[arg(long)]
    no_connect: bool,

    /// Fetch the current state over REST, write it as JSON and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(url) = args.url {
        settings.connection.url = url;
    }
    if let Some(api) = args.api {
        settings.api.base_url = api;
    }
    if let Some(file) = args.log_file {
        settings.logging.file = file;
    }
    if let Some(level) = args.log_level {
        settings.logging.level = level;
    }
    if args.no_connect {
        settings.connection.auto_connect = false;
    }
    let config = settings.resolve()?;

    init_logging(&config)?;

    let runtime = Runtime::new()?;
    let client = ApiClient::builder()
        .base_url(config.api_base_url.clone())
        .timeout(config.api_timeout)
        .build()?;

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return runtime.block_on(export_to_file(&client, &export_path));
    }

    run_tui(&runtime, client, config)
}

/// Send tracing output to the log file; the terminal belongs to the dashboard.
fn init_logging(config: &RuntimeConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Failed to open log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(StdMutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Run the dashboard until the user quits.
fn run_tui(runtime: &Runtime, client: ApiClient, config: RuntimeConfig) -> Result<()> {
    let store = SystemStore::new(config.limits);
    let health = Arc::new(Mutex::new(HealthTracker::new(config.thresholds)));

    // Background tasks need the runtime context to spawn
    let (sync, mut poller) = {
        let _guard = runtime.enter();
        let sync = SyncClient::spawn(config.sync.clone(), store.clone(), health);
        let poller = Poller::spawn(
            client.clone(),
            store.clone(),
            Some(sync.fallback()),
            config.polling,
        );
        (sync, poller)
    };
    info!(url = %config.sync.url, api = %client.base_url(), "dashboard started");

    let actions = Actions::new(client, store.clone());
    let mut app = App::new(store, config.thresholds, Theme::auto_detect())
        .with_sync(sync)
        .with_actions(actions, runtime.handle().clone());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    poller.stop();
    if let Some(sync) = app.take_sync() {
        runtime.block_on(sync.shutdown());
    }
    info!("dashboard stopped");

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.refresh();
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                // Content starts after header (1) + tabs (1)
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, 2),
                _ => {}
            }
        }
    }
    Ok(())
}

/// Fetch host information, latest metrics and processes once and write them as JSON.
async fn export_to_file(client: &ApiClient, export_path: &Path) -> Result<()> {
    let (info, metrics, processes) = tokio::join!(
        client.system_info(),
        client.latest_metrics(),
        client.processes(0, 1000),
    );

    let info = info.context("Failed to fetch system info")?;
    let processes = processes.context("Failed to fetch processes")?;
    // No stored metrics yet is not fatal
    let metrics = match metrics {
        Ok(metrics) => Some(metrics),
        Err(e) if e.is_not_found() => None,
        Err(e) => {
            warn!(error = %e, "failed to fetch latest metrics");
            None
        }
    };

    let export = serde_json::json!({
        "systemInfo": info,
        "metrics": metrics,
        "processes": processes,
    });
    let json = serde_json::to_string_pretty(&export)?;
    std::fs::write(export_path, json)
        .with_context(|| format!("Failed to write {}", export_path.display()))?;

    println!("Exported system state to: {}", export_path.display());
    Ok(())
}
