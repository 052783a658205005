//! Application state management for topanime
//!
//! This module contains the main application state, handling keyboard input,
//! applying finished fetches and deciding which fetches to start next.

use crossterm::event::{KeyCode, KeyEvent};
use tracing::info;

use crate::tasks::{FetchMessage, Job};
use topanime::catalog::{Catalog, KindFilter};
use topanime::cli::StartupConfig;
use topanime::data::ListItem;
use topanime::detail::DetailLoader;
use topanime::theme::{Theme, ThemeStore};

/// Where typed characters go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Keys are commands
    #[default]
    Normal,
    /// Keys edit the search query
    Search,
}

/// Main application struct managing state and data
pub struct App {
    /// Accumulated top list
    pub catalog: Catalog,
    /// Detail overlay state
    pub detail: DetailLoader,
    /// Active color theme
    pub theme: Theme,
    /// Title search text
    pub query: String,
    /// Type filter
    pub kind_filter: KindFilter,
    /// Whether keys edit the query or run commands
    pub input_mode: InputMode,
    /// Index of the selected row within the filtered list
    pub selected_index: usize,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    theme_store: ThemeStore,
    /// Fetches requested since the last `take_jobs`
    pending: Vec<Job>,
}

impl App {
    /// Creates an App around `catalog`, starting with the saved theme
    pub fn new(catalog: Catalog, theme_store: ThemeStore) -> Self {
        let theme = theme_store.load();
        Self {
            catalog,
            detail: DetailLoader::new(),
            theme,
            query: String::new(),
            kind_filter: KindFilter::All,
            input_mode: InputMode::Normal,
            selected_index: 0,
            show_help: false,
            should_quit: false,
            theme_store,
            pending: Vec::new(),
        }
    }

    /// Creates an App from the startup configuration.
    ///
    /// A `--theme` override applies to this run only and is not saved.
    pub fn with_startup_config(config: &StartupConfig) -> Self {
        let mut app = Self::new(
            Catalog::new(config.app.cache_store()),
            config.app.theme_store(),
        );
        if let Some(theme) = config.theme {
            app.theme = theme;
        }
        app
    }

    /// Loads the list from the cache or queues the first page
    ///
    /// With `fresh` the cache is cleared first.
    pub fn start(&mut self, fresh: bool) {
        if fresh {
            self.catalog.reset();
        }
        if let Some(request) = self.catalog.initialize() {
            self.pending.push(Job::Page(request));
        }
    }

    /// Returns and clears the fetches queued by input handling
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.pending)
    }

    /// Items passing the current query and type filter
    pub fn visible_items(&self) -> Vec<&ListItem> {
        self.catalog.filtered(&self.query, &self.kind_filter)
    }

    /// Returns the currently selected item, if any
    pub fn selected_item(&self) -> Option<&ListItem> {
        self.visible_items().get(self.selected_index).copied()
    }

    /// True while the detail overlay is open
    pub fn detail_open(&self) -> bool {
        self.detail.selected_id().is_some()
    }

    /// Applies a finished background fetch
    pub fn handle_message(&mut self, message: FetchMessage) {
        match message {
            FetchMessage::PageLoaded { request, result } => {
                if self.catalog.complete_page(request, result) {
                    self.clamp_selection();
                }
            }
            FetchMessage::DetailLoaded { request, result } => {
                self.detail.complete(request, result);
            }
        }
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit (from the list or the detail overlay)
    /// - `Up`/`k`, `Down`/`j`: Move selection
    /// - `Enter`: Open the detail overlay for the selected item
    /// - `Esc`: Close the detail overlay, leave search, or quit from the list
    /// - `/`: Edit the search query
    /// - `t`: Cycle the type filter
    /// - `m`: Load the next page
    /// - `R`: Retry the failed page
    /// - `c`: Clear the cache and reload page 1
    /// - `T`: Toggle and save the theme
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        if self.input_mode == InputMode::Search {
            self.handle_search_key(key_event);
            return;
        }

        if self.detail_open() {
            match key_event.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Esc | KeyCode::Backspace => {
                    self.detail.select(None);
                }
                KeyCode::Char('T') => self.toggle_theme(),
                KeyCode::Char('?') => self.show_help = true,
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection_up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection_down();
            }
            KeyCode::Enter => {
                self.open_selected();
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('t') => {
                self.kind_filter = self.kind_filter.next();
                self.selected_index = 0;
            }
            KeyCode::Char('m') => {
                if let Some(request) = self.catalog.load_more() {
                    self.pending.push(Job::Page(request));
                }
            }
            KeyCode::Char('R') => {
                if let Some(request) = self.catalog.retry() {
                    self.pending.push(Job::Page(request));
                }
            }
            KeyCode::Char('c') => {
                self.clear_and_reload();
            }
            KeyCode::Char('T') => {
                self.toggle_theme();
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.selected_index = 0;
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.selected_index = 0;
            }
            _ => {}
        }
    }

    fn open_selected(&mut self) {
        let Some(id) = self.selected_item().map(|item| item.id) else {
            return;
        };
        if let Some(request) = self.detail.select(Some(id)) {
            self.pending.push(Job::Detail(request));
        }
    }

    fn clear_and_reload(&mut self) {
        info!("Clearing cache and reloading");
        self.detail.select(None);
        self.selected_index = 0;
        self.start(true);
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.theme_store.save(self.theme);
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.visible_items().len();
        if count == 0 {
            return;
        }
        if self.selected_index == 0 {
            self.selected_index = count - 1;
        } else {
            self.selected_index -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.visible_items().len();
        if count == 0 {
            return;
        }
        self.selected_index = (self.selected_index + 1) % count;
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_items().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }
}
