//! Command-line interface parsing for topanime
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a `StartupConfig`: the library configuration plus the startup options that
//! only the binary cares about (theme override, print mode, fresh start).

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::catalog::KindFilter;
use crate::config::AppConfig;
use crate::data::AnimeKind;
use crate::theme::Theme;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified theme name is not recognized
    #[error("Invalid theme: '{0}'. Valid themes: dark, light")]
    InvalidTheme(String),

    /// The specified type filter is not recognized
    #[error("Invalid kind: '{0}'. Valid kinds: all, tv, movie, special, ova, unknown")]
    InvalidKind(String),

    /// A duration argument was zero
    #[error("Invalid {0}: must be greater than zero")]
    ZeroDuration(&'static str),

    /// A duration argument does not fit in a timestamp difference
    #[error("Invalid {0}: value is too large")]
    DurationTooLarge(&'static str),
}

/// topanime - browse the top anime list from the Jikan API
#[derive(Parser, Debug)]
#[command(name = "topanime")]
#[command(about = "Browse, search and filter the top anime list")]
#[command(version)]
pub struct Cli {
    /// Jikan API base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// How long the cached list stays valid, in minutes
    #[arg(long, value_name = "MINS")]
    pub cache_ttl_mins: Option<i64>,

    /// Directory for the list cache and log file
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory only
    #[arg(long)]
    pub no_cache: bool,

    /// Clear the cached list before starting
    #[arg(long)]
    pub fresh: bool,

    /// Start with this theme instead of the saved one (dark, light)
    #[arg(long, value_name = "THEME")]
    pub theme: Option<String>,

    /// Print the first page to stdout instead of starting the terminal UI
    #[arg(long)]
    pub print: bool,

    /// Title search applied to the printed list
    #[arg(long, value_name = "TEXT", requires = "print")]
    pub search: Option<String>,

    /// Type filter applied to the printed list (all, tv, movie, special, ova, unknown)
    #[arg(long, value_name = "KIND", requires = "print")]
    pub kind: Option<String>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// Settings for the library components
    pub app: AppConfig,
    /// Theme override; `None` uses the saved preference
    pub theme: Option<Theme>,
    /// Clear the cached list before the first load
    pub fresh: bool,
    /// Non-interactive print mode
    pub print: bool,
    /// Title query for print mode
    pub search: String,
    /// Type filter for print mode
    pub kind: KindFilter,
}

/// Parses a theme argument
pub fn parse_theme_arg(s: &str) -> Result<Theme, CliError> {
    s.parse::<Theme>().map_err(|_| CliError::InvalidTheme(s.to_string()))
}

/// Parses a kind argument; "all" disables the filter
pub fn parse_kind_arg(s: &str) -> Result<KindFilter, CliError> {
    if s.eq_ignore_ascii_case("all") {
        return Ok(KindFilter::All);
    }
    AnimeKind::parse_filter_name(s)
        .map(KindFilter::Only)
        .ok_or_else(|| CliError::InvalidKind(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with defaults for everything not given
    /// * `Err(CliError)` if a theme, kind or duration is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut app = AppConfig::default();

        if let Some(base_url) = &cli.base_url {
            app.base_url = base_url.clone();
        }
        if let Some(secs) = cli.timeout_secs {
            if secs == 0 {
                return Err(CliError::ZeroDuration("timeout"));
            }
            app.request_timeout = Duration::from_secs(secs);
        }
        if let Some(mins) = cli.cache_ttl_mins {
            if mins <= 0 {
                return Err(CliError::ZeroDuration("cache TTL"));
            }
            app.cache_ttl = chrono::Duration::try_minutes(mins)
                .ok_or(CliError::DurationTooLarge("cache TTL"))?;
        }
        app.cache_dir = cli.cache_dir.clone();
        app.persist_cache = !cli.no_cache;

        let theme = cli.theme.as_deref().map(parse_theme_arg).transpose()?;
        let kind = match cli.kind.as_deref() {
            Some(kind) => parse_kind_arg(kind)?,
            None => KindFilter::All,
        };

        Ok(StartupConfig {
            app,
            theme,
            fresh: cli.fresh,
            print: cli.print,
            search: cli.search.clone().unwrap_or_default(),
            kind,
        })
    }
}
