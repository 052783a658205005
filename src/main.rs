//! topanime - browse the Jikan top anime list in the terminal
//!
//! A terminal UI application that pages through the top anime list, caches it
//! locally, and lets you search, filter by type and open full details.

mod app;
mod tasks;
mod ui;

use std::io;
use std::panic;
use std::process;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use app::App;
use tasks::FetchHandle;
use topanime::catalog::Catalog;
use topanime::cli::{Cli, StartupConfig};
use topanime::logging;

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Loads page 1 (from the cache or the network) and prints the filtered list
async fn run_print(config: &StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = config.app.client();
    let mut catalog = Catalog::new(config.app.cache_store());
    if config.fresh {
        catalog.reset();
    }

    catalog.initialize_from(&client).await;

    if let Some(e) = catalog.error() {
        error!(error = %e, "Could not load the top list");
        return Err(e.clone().into());
    }

    for item in catalog.filtered(&config.search, &config.kind) {
        println!(
            "{:<6} {} [{}] score {} eps {}",
            item.rank_label(),
            item.title,
            item.kind,
            item.score_label(),
            item.episodes_label()
        );
    }
    Ok(())
}

/// Runs the interactive terminal UI until the user quits
async fn run_tui(config: &StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut fetcher = FetchHandle::new(config.app.client());
    let mut app = App::with_startup_config(config);
    app.start(config.fresh);

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    loop {
        for job in app.take_jobs() {
            fetcher.spawn(job);
        }

        // Apply finished fetches
        while let Some(message) = fetcher.try_recv() {
            app.handle_message(message);
        }

        terminal.draw(|f| ui::render(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    info!("Exiting");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    if config.print {
        logging::init_stderr();
        return run_print(&config).await;
    }

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = match config.app.resolved_cache_dir() {
        Some(dir) => match logging::init_file(&dir) {
            Ok((guard, _path)) => Some(guard),
            Err(e) => {
                eprintln!("Warning: could not open log file in {}: {}", dir.display(), e);
                None
            }
        },
        None => None,
    };

    run_tui(&config).await
}
