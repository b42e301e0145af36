//! Bookshelf - a terminal user interface for a REST book catalogue.
//!
//! Lists the books served by the backend and lets the user add, edit and
//! delete them. The collection is fetched once and kept in sync locally after
//! every change.

mod app;
mod dialog;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bookshelf_core::{ApiClient, BooksBackend, Config};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Prefix of the daily log files
const LOG_FILE_PREFIX: &str = "bookshelf.log";

const USAGE: &str = "\
Usage: bookshelf [OPTIONS]

Options:
  --api-url <URL>   Backend base URL (overrides config and BOOKSHELF_API_URL)
  --save-config     Write the effective settings to the config file
  --dump            Print the book collection as JSON and exit
  -h, --help        Show this help";

// ============================================================================
// Command line
// ============================================================================

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    api_url: Option<String>,
    dump: bool,
    save_config: bool,
    help: bool,
}

impl CliArgs {
    fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--dump" => parsed.dump = true,
                "--save-config" => parsed.save_config = true,
                "-h" | "--help" => parsed.help = true,
                "--api-url" => {
                    let url = args.next().context("--api-url needs a value")?;
                    parsed.api_url = Some(url);
                }
                other => match other.strip_prefix("--api-url=") {
                    Some(url) => parsed.api_url = Some(url.to_string()),
                    None => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
                },
            }
        }
        Ok(parsed)
    }
}

// ============================================================================
// Logging
// ============================================================================

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a daily file so output does not corrupt the terminal UI.
/// The returned guard flushes the writer when dropped.
fn init_file_tracing(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(guard)
}

fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

// ============================================================================
// Entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;
    if let Some(url) = args.api_url.as_deref() {
        config.set_api_base_url(url);
    }
    if args.save_config {
        config.save().context("Failed to save config")?;
    }

    if args.dump {
        init_stderr_tracing();
        return dump_books(&config).await;
    }

    let _log_guard = init_file_tracing(&config)?;
    info!("Bookshelf starting");

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.load_books();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
    }

    info!("Bookshelf shutting down");
    Ok(())
}

/// Print the whole collection to stdout as JSON
async fn dump_books(config: &Config) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    eprintln!("Fetching books from {}...", client.base_url());

    let books = client
        .list_books()
        .await
        .with_context(|| format!("Failed to fetch books from {}", client.base_url()))?;

    println!("{}", serde_json::to_string_pretty(&books)?);
    eprintln!("{} books", books.len());
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();
        app.on_tick();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_args() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_api_url_forms() {
        let spaced = parse(&["--api-url", "http://books:8080"]).unwrap();
        assert_eq!(spaced.api_url.as_deref(), Some("http://books:8080"));

        let inline = parse(&["--dump", "--api-url=http://books:8080"]).unwrap();
        assert_eq!(inline.api_url.as_deref(), Some("http://books:8080"));
        assert!(inline.dump);
    }

    #[test]
    fn test_missing_value_and_unknown_flag() {
        assert!(parse(&["--api-url"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
    }
}
