//! Accumulated top list with paging, caching and filtering
//!
//! `Catalog` owns the in-memory list, decides which page to request next and
//! merges finished pages into the list and the cache. Requests are plain values
//! carrying a token; only the completion for the most recent token is applied,
//! so a late response can never overwrite newer state.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::data::{AnimeKind, FetchError, ListItem, Page, PageSource, PAGE_SIZE};

/// Lifecycle of the list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Nothing requested yet
    Empty,
    /// Fetching the first page
    Loading,
    /// Items are available and nothing is in flight
    Ready,
    /// Fetching a page after the first
    LoadingMore,
    /// The last request failed; previously loaded items are kept
    Error,
}

/// Type filter applied on top of the text query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(AnimeKind),
}

impl KindFilter {
    /// Returns true if `kind` passes the filter
    pub fn matches(&self, kind: &AnimeKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(wanted) => wanted == kind,
        }
    }

    /// Cycles All -> TV -> Movie -> Special -> OVA -> Unknown -> All
    pub fn next(&self) -> Self {
        let kinds = &AnimeKind::FILTERABLE;
        match self {
            KindFilter::All => KindFilter::Only(kinds[0].clone()),
            KindFilter::Only(current) => match kinds.iter().position(|k| k == current) {
                Some(i) if i + 1 < kinds.len() => KindFilter::Only(kinds[i + 1].clone()),
                _ => KindFilter::All,
            },
        }
    }

    pub fn label(&self) -> &str {
        match self {
            KindFilter::All => "All types",
            KindFilter::Only(kind) => kind.label(),
        }
    }
}

/// A page fetch the caller should perform and then hand back to [`Catalog::complete_page`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub token: u64,
    pub page: u32,
}

/// Returns the items whose title contains `query` (case-insensitive, trimmed)
/// and whose kind passes `kind`, in list order
pub fn apply_filter<'a>(items: &'a [ListItem], query: &str, kind: &KindFilter) -> Vec<&'a ListItem> {
    let needle = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| needle.is_empty() || item.title.to_lowercase().contains(&needle))
        .filter(|item| kind.matches(&item.kind))
        .collect()
}

/// The accumulated top list
pub struct Catalog {
    cache: CacheStore,
    items: Vec<ListItem>,
    /// Highest page merged into `items`; 0 before anything is loaded
    page: u32,
    has_more: bool,
    state: ListState,
    error: Option<FetchError>,
    /// Page whose fetch failed, for `retry`
    failed_page: Option<u32>,
    /// Token of the most recently issued request
    token: u64,
    in_flight: Option<PageRequest>,
    cached_at: Option<DateTime<Utc>>,
}

impl Catalog {
    pub fn new(cache: CacheStore) -> Self {
        Self {
            cache,
            items: Vec::new(),
            page: 0,
            has_more: true,
            state: ListState::Empty,
            error: None,
            failed_page: None,
            token: 0,
            in_flight: None,
            cached_at: None,
        }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Highest page loaded so far
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// True while a page request is outstanding
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// When the current list was last persisted or adopted from the cache
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cached_at
    }

    /// Filtered view over the full list
    pub fn filtered(&self, query: &str, kind: &KindFilter) -> Vec<&ListItem> {
        apply_filter(&self.items, query, kind)
    }

    /// Starts the list from the cache, or asks for page 1 on a miss
    ///
    /// # Returns
    /// * `None` if a cached snapshot was adopted
    /// * `Some(PageRequest)` for page 1 otherwise
    pub fn initialize(&mut self) -> Option<PageRequest> {
        self.state = ListState::Loading;
        self.error = None;

        match self.cache.read() {
            Some(envelope) => {
                self.cached_at = envelope.written_at();
                self.page = envelope
                    .highest_page
                    .max(1)
                    .max(envelope.items.len().div_ceil(PAGE_SIZE) as u32);
                self.has_more = envelope.items.len() % PAGE_SIZE == 0;
                self.items = envelope.items;
                self.state = ListState::Ready;
                info!(
                    items = self.items.len(),
                    page = self.page,
                    "Adopted cached top list"
                );
                None
            }
            None => Some(self.load_page(1)),
        }
    }

    /// Issues a request for `page`, superseding any request still in flight
    pub fn load_page(&mut self, page: u32) -> PageRequest {
        self.token += 1;
        let request = PageRequest {
            token: self.token,
            page,
        };

        self.state = if page <= 1 {
            ListState::Loading
        } else {
            ListState::LoadingMore
        };
        self.error = None;
        self.in_flight = Some(request);
        debug!(page, token = request.token, "Requesting page");
        request
    }

    /// Requests the next page unless the list is exhausted or a fetch is in flight
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if !self.has_more || self.in_flight.is_some() {
            return None;
        }
        let Some(next) = self.page.checked_add(1) else {
            warn!(page = self.page, "No page after the last representable one");
            self.has_more = false;
            return None;
        };
        Some(self.load_page(next))
    }

    /// Re-requests the page whose fetch last failed
    pub fn retry(&mut self) -> Option<PageRequest> {
        if self.state != ListState::Error || self.in_flight.is_some() {
            return None;
        }
        let page = self.failed_page.unwrap_or(self.page.saturating_add(1));
        Some(self.load_page(page))
    }

    /// Applies the outcome of `request`
    ///
    /// Returns false, leaving all state untouched, if `request` is not the
    /// outstanding one (superseded, reset, or already completed).
    pub fn complete_page(&mut self, request: PageRequest, result: Result<Page, FetchError>) -> bool {
        if self.in_flight != Some(request) {
            debug!(
                page = request.page,
                token = request.token,
                current = self.token,
                "Dropping stale page response"
            );
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let is_first = request.page <= 1;
                self.cache.write(&page.items, request.page, is_first);
                self.cached_at = Some(Utc::now());

                if is_first {
                    self.items = page.items;
                } else {
                    self.items.extend(page.items);
                }
                self.page = request.page;
                self.has_more = !page.is_last_page;
                self.failed_page = None;
                self.state = ListState::Ready;
            }
            Err(e) => {
                warn!(page = request.page, error = %e, "Page fetch failed");
                self.error = Some(e);
                self.failed_page = Some(request.page);
                self.state = ListState::Error;
            }
        }
        true
    }

    /// Drops the cache and the in-memory list; responses already in flight are ignored
    ///
    /// Call [`initialize`](Self::initialize) afterwards to start a fresh cycle.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.token += 1;
        self.in_flight = None;
        self.items.clear();
        self.page = 0;
        self.has_more = true;
        self.error = None;
        self.failed_page = None;
        self.cached_at = None;
        self.state = ListState::Empty;
        info!("Catalog reset");
    }

    /// Runs [`initialize`](Self::initialize) against `source`
    pub async fn initialize_from<S: PageSource>(&mut self, source: &S) {
        if let Some(request) = self.initialize() {
            self.run(source, request).await;
        }
    }

    /// Runs [`load_page`](Self::load_page) against `source`
    pub async fn load_page_from<S: PageSource>(&mut self, source: &S, page: u32) {
        let request = self.load_page(page);
        self.run(source, request).await;
    }

    /// Runs [`load_more`](Self::load_more) against `source`
    pub async fn load_more_from<S: PageSource>(&mut self, source: &S) {
        if let Some(request) = self.load_more() {
            self.run(source, request).await;
        }
    }

    /// Runs [`retry`](Self::retry) against `source`
    pub async fn retry_from<S: PageSource>(&mut self, source: &S) {
        if let Some(request) = self.retry() {
            self.run(source, request).await;
        }
    }

    async fn run<S: PageSource>(&mut self, source: &S, request: PageRequest) {
        let result = source.fetch_page(request.page).await;
        self.complete_page(request, result);
    }
}
