//! Shop manager - terminal dashboard and form commands for a tailoring shop
//! whose records live in Google Sheets.
//!
//! Running `shop` with no arguments opens the dashboard; the subcommands
//! submit forms, drive the combined-order flow and maintain the offline cache.

mod app;
mod cli;
mod commands;
mod context;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use shopsheets_core::dashboard::PaymentFilter;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use cli::{Cli, Command};
use context::Context;
use ui::input::handle_input;
use ui::render::render;

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize logging. The dashboard owns the terminal, so it logs to a daily
/// file under `log_dir`; commands log to stderr.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // RUST_LOG overrides the default level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "shop.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Dashboard);

    // Logging starts after the context so the dashboard can log into the
    // cache dir; config problems before that go to stderr directly.
    let ctx = Context::new()?;
    let log_dir = ctx.log_dir();
    let _guard = match command {
        Command::Dashboard => init_tracing(Some(&log_dir)),
        _ => init_tracing(None),
    };

    let result = match command {
        Command::Dashboard => run_dashboard(&ctx).await,
        Command::Setup { key, forget } => commands::setup(&ctx, key, forget).await,
        Command::Submit { form, file } => commands::submit(&ctx, form, file.as_deref()).await,
        Command::Combined(cmd) => commands::combined(&ctx, cmd).await,
        Command::Workers(cmd) => commands::workers(&ctx, cmd).await,
        Command::Payments {
            worker,
            from,
            to,
            notes,
        } => {
            let filter = PaymentFilter {
                worker,
                from,
                to,
                notes,
            };
            commands::payments(&ctx, filter).await
        }
        Command::Cache(cmd) => commands::cache(&ctx, cmd).await,
    };

    // Let background cache refreshes finish before the runtime shuts down
    ctx.router.settle().await;
    result
}

async fn run_dashboard(ctx: &Context) -> Result<()> {
    let api_key = Context::api_key()?;
    info!("Shop dashboard starting");

    let mut app = App::new(
        ctx.sheets(&api_key),
        ctx.sheet_map(),
        Duration::from_secs(ctx.config.refresh_interval_secs),
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        eprintln!("Error: {}", e);
    }

    info!("Shop dashboard shutting down");
    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Yield so spawned refreshes make progress on the runtime
        tokio::task::yield_now().await;
    }
}
