//! zmview - a terminal viewer for ZoneMinder surveillance servers.
//!
//! Logs into a ZoneMinder host, lists its camera monitors, and produces the
//! MJPEG stream URL for any of them. Session state is persisted so the next
//! start skips the login form.

mod app;
mod config;
mod ui;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zmview_core::api::ZmClient;
use zmview_core::auth::Credentials;
use zmview_core::storage::FileStorage;

use app::{App, AppState};
use config::Config;
use ui::input::handle_input;
use ui::render::render;

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize tracing to a daily-rolling log file. The terminal belongs to
/// the UI, so nothing may write to stderr while it runs.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = Config::log_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, "zmview.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG controls the level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--dump-monitors" {
        return dump_monitors().await;
    }

    let _guard = init_tracing()?;
    info!("zmview starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new()?;
    app.startup().await;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("zmview shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Print the monitor list as JSON to stdout, logging in from the terminal
/// when no stored session is usable. Prompts and progress go to stderr so
/// the output stays pipeable.
async fn dump_monitors() -> Result<()> {
    let storage = FileStorage::new(Config::session_dir()?)?;
    let mut client = ZmClient::new(storage)?;

    if !client.ensure_connected().await? {
        eprintln!("No stored session; please log in.");
        let host = prompt("Host: ")?;
        let user = prompt("User: ")?;
        let password = rpassword::prompt_password("Password: ")?;
        client
            .login(Credentials::new(&host, &user, &password))
            .await?;
    }

    let monitors = client.list_monitors().await?;
    eprintln!("Found {} monitors", monitors.len());
    println!("{}", serde_json::to_string_pretty(&monitors)?);
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    eprint!("{}", label);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
