//! Folio TUI Entry Point
//!
//! Launches the portfolio page in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (built-in content)
//! folio-tui
//!
//! # Custom content and a faster intro
//! folio-tui --content ./content.toml --intro-speed 10
//!
//! # Log to a file (the screen belongs to the page)
//! FOLIO_LOG_FILE=/tmp/folio.log RUST_LOG=folio_core=debug folio-tui
//! ```

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use folio_core::{default_config_path, load_config_from_path, ConfigOverrides, FolioConfig};
use folio_tui::App;

/// Folio - a cozy portfolio page in your terminal
#[derive(Parser, Debug)]
#[command(name = "folio-tui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "FOLIO_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Content file (TOML or JSON) replacing the built-in text
    #[arg(long, value_name = "PATH")]
    content: Option<PathBuf>,

    /// Intro typing speed in milliseconds per character
    #[arg(long, value_name = "MS")]
    intro_speed: Option<u64>,

    /// Blackboard typing speed in milliseconds per character
    #[arg(long, value_name = "MS")]
    board_speed: Option<u64>,

    /// Frames per second
    #[arg(long, value_name = "N")]
    fps: Option<u32>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(path) = &self.content {
            overrides = overrides.with_content_path(path.clone());
        }
        if let Some(ms) = self.intro_speed {
            overrides = overrides.with_intro_speed_ms(ms);
        }
        if let Some(ms) = self.board_speed {
            overrides = overrides.with_board_speed_ms(ms);
        }
        if let Some(fps) = self.fps {
            overrides = overrides.with_fps(fps);
        }
        overrides
    }
}

/// Initialize logging into `FOLIO_LOG_FILE`, if set
///
/// Without a log file nothing is installed, so nothing is written over the
/// alternate screen.
fn init_logging() -> Result<()> {
    let Ok(path) = std::env::var("FOLIO_LOG_FILE") else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {path}"))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("folio_tui=info,folio_core=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(())
}

fn load_config(args: &Args) -> Result<FolioConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    let config = load_config(&args)?;
    let content = config.load_content().context("Failed to load content")?;
    tracing::info!(
        source = ?config.source(),
        topics = content.topic_count(),
        "Starting folio"
    );

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: folio-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means stdin or stdout is piped, or the session");
        eprintln!("has no terminal (SSH without -t, CI, containers).");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let size = terminal.size()?;
    let mut app = App::new(&config, content, size.width, size.height);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Propagate any errors
    result
}
