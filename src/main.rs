// ABOUTME: Main entry point for the orca TUI application
// Spawns the backend process, then runs the crossterm event loop around App::tick

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture, Event, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, Terminal};
use std::{
    io,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{error, info, warn};

use orca::app::App;
use orca::backend::RpcClient;
use orca::components::LayoutComponent;
use orca::config::{AppConfig, Preferences};
use orca::logs;

#[derive(Debug, Parser)]
#[command(name = "orca", version, about = "Manage coding agent sessions across git worktrees and tmux")]
struct Cli {
    /// Backend program to spawn (overrides the config file)
    #[arg(long)]
    backend: Option<String>,

    /// Argument passed to the backend; repeat for several
    #[arg(long = "backend-arg", value_name = "ARG")]
    backend_args: Vec<String>,

    /// Config file to load instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "orca=debug"
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = AppConfig::data_dir().unwrap_or_else(|_| PathBuf::from(".orca"));
    let log_file = setup_logging(&data_dir, cli.log_level.as_deref())?;
    setup_panic_handler();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!("Using default config: {}", e);
            AppConfig::default()
        }),
    };
    if let Some(command) = cli.backend {
        config.backend.command = command;
    }
    if !cli.backend_args.is_empty() {
        config.backend.args = cli.backend_args;
    }

    let preferences = Preferences::open(data_dir.join("preferences.json"));

    let (client, events) = RpcClient::spawn(&config.backend)
        .with_context(|| format!("Failed to start backend '{}'", config.backend.command))?;

    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms.max(10));
    let mut layout = LayoutComponent::with_sidebar_percent(config.ui.sidebar_percent);
    let mut app = App::new(Arc::new(client), events, config, preferences).with_log_file(log_file);
    app.init().await;

    run_tui(&mut app, &mut layout, tick_rate).await?;

    info!("orca exiting");
    Ok(())
}

async fn run_tui(app: &mut App, layout: &mut LayoutComponent, tick_rate: Duration) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    app.resize(size.width, size.height).await;

    let mut last_tick = Instant::now();

    let result = loop {
        if let Err(e) = terminal.draw(|frame| layout.render(frame, &app.state)) {
            break Err(e.into());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key_event)) if key_event.kind == KeyEventKind::Press => {
                    app.handle_key(key_event);
                }
                Ok(Event::Paste(text)) => app.handle_paste(text),
                Ok(Event::Resize(width, height)) => app.resize(width, height).await,
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            },
            Ok(false) => {}
            Err(e) => break Err(e.into()),
        }

        if last_tick.elapsed() >= tick_rate {
            if let Err(e) = app.tick().await {
                error!("Error during app tick: {}", e);
            }
            last_tick = Instant::now();
        }

        if app.state.should_quit {
            break Ok(());
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}

/// Returns the file this run logs to, for the in-app log panel.
fn setup_logging(data_dir: &std::path::Path, level: Option<&str>) -> Result<PathBuf> {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let log_dir = logs::log_dir(data_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let log_file = logs::new_log_file(data_dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to create log file {:?}", log_file))?;

    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "orca=info".into()),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(file)
                .with_ansi(false), // No ANSI colors in log file
        )
        .with(filter)
        .init();

    Ok(log_file)
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        // Ensure terminal is restored before logging the panic
        let _ = disable_raw_mode();
        let _ = execute!(
            std::io::stderr(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        );

        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs for more details.");
    }));
}
