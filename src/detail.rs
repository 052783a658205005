//! On-demand loading of a single anime's full record
//!
//! Selecting an id issues a `DetailRequest`; selecting another id (or nothing)
//! supersedes it, and a superseded request's result is discarded when it
//! arrives. The network call itself is not aborted.

use tracing::debug;

use crate::data::{DetailItem, DetailSource, FetchError};

/// What the detail pane currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Nothing selected
    Idle,
    Loading { id: u32 },
    Ready(DetailItem),
    Failed { id: u32, message: String },
}

/// A detail fetch to perform and hand back to [`DetailLoader::complete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRequest {
    pub token: u64,
    pub id: u32,
}

#[derive(Debug)]
pub struct DetailLoader {
    state: DetailState,
    token: u64,
}

impl Default for DetailLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailLoader {
    pub fn new() -> Self {
        Self {
            state: DetailState::Idle,
            token: 0,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Id of the selected entry, if any
    pub fn selected_id(&self) -> Option<u32> {
        match &self.state {
            DetailState::Idle => None,
            DetailState::Loading { id } | DetailState::Failed { id, .. } => Some(*id),
            DetailState::Ready(detail) => Some(detail.id),
        }
    }

    /// Changes the selection
    ///
    /// `None` clears the pane immediately without a request. Any request issued
    /// before this call becomes stale.
    pub fn select(&mut self, id: Option<u32>) -> Option<DetailRequest> {
        self.token += 1;
        match id {
            None => {
                self.state = DetailState::Idle;
                None
            }
            Some(id) => {
                self.state = DetailState::Loading { id };
                Some(DetailRequest {
                    token: self.token,
                    id,
                })
            }
        }
    }

    /// Applies the outcome of `request` if it is still the current selection
    pub fn complete(&mut self, request: DetailRequest, result: Result<DetailItem, FetchError>) -> bool {
        if request.token != self.token {
            debug!(id = request.id, token = request.token, "Dropping stale detail response");
            return false;
        }

        self.state = match result {
            Ok(detail) => DetailState::Ready(detail),
            Err(e) => DetailState::Failed {
                id: request.id,
                message: e.to_string(),
            },
        };
        true
    }

    /// Selects `id` and loads it from `source`
    pub async fn load_detail_from<S: DetailSource>(&mut self, source: &S, id: u32) {
        if let Some(request) = self.select(Some(id)) {
            let result = source.fetch_detail(id).await;
            self.complete(request, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NO_SYNOPSIS;

    fn detail(id: u32) -> DetailItem {
        DetailItem {
            id,
            title: format!("Anime {}", id),
            image_url: String::new(),
            episodes: Some(12),
            score: Some(8.5),
            synopsis: NO_SYNOPSIS.to_string(),
            aired: "Unknown".to_string(),
            genres: vec!["Action".to_string()],
            source_url: format!("https://myanimelist.net/anime/{}", id),
        }
    }

    struct FixedSource(Result<DetailItem, FetchError>);

    impl DetailSource for FixedSource {
        async fn fetch_detail(&self, _id: u32) -> Result<DetailItem, FetchError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        let loader = DetailLoader::new();
        assert_eq!(loader.state(), &DetailState::Idle);
        assert!(loader.selected_id().is_none());
    }

    #[test]
    fn test_select_enters_loading() {
        let mut loader = DetailLoader::new();

        let request = loader.select(Some(42)).expect("selecting an id should issue a request");

        assert_eq!(request.id, 42);
        assert_eq!(loader.state(), &DetailState::Loading { id: 42 });
        assert_eq!(loader.selected_id(), Some(42));
    }

    #[test]
    fn test_complete_current_request_applies_result() {
        let mut loader = DetailLoader::new();
        let request = loader.select(Some(42)).unwrap();

        assert!(loader.complete(request, Ok(detail(42))));
        assert_eq!(loader.state(), &DetailState::Ready(detail(42)));
    }

    #[test]
    fn test_late_response_for_previous_selection_is_ignored() {
        let mut loader = DetailLoader::new();
        let first = loader.select(Some(1)).unwrap();
        let second = loader.select(Some(2)).unwrap();

        assert!(!loader.complete(first, Ok(detail(1))));
        assert_eq!(loader.state(), &DetailState::Loading { id: 2 });

        assert!(loader.complete(second, Ok(detail(2))));
        assert!(!loader.complete(first, Ok(detail(1))));
        assert_eq!(loader.state(), &DetailState::Ready(detail(2)));
    }

    #[test]
    fn test_deselect_clears_without_request() {
        let mut loader = DetailLoader::new();
        let request = loader.select(Some(7)).unwrap();

        assert!(loader.select(None).is_none());
        assert_eq!(loader.state(), &DetailState::Idle);

        assert!(!loader.complete(request, Ok(detail(7))));
        assert_eq!(loader.state(), &DetailState::Idle);
    }

    #[test]
    fn test_failure_records_message() {
        let mut loader = DetailLoader::new();
        let request = loader.select(Some(5)).unwrap();

        loader.complete(request, Err(FetchError::ServerStatus(404)));

        assert_eq!(
            loader.state(),
            &DetailState::Failed {
                id: 5,
                message: "API 404".to_string()
            }
        );
        assert_eq!(loader.selected_id(), Some(5));
    }

    #[test]
    fn test_reselecting_same_id_supersedes_earlier_request() {
        let mut loader = DetailLoader::new();
        let first = loader.select(Some(3)).unwrap();
        let second = loader.select(Some(3)).unwrap();

        assert!(!loader.complete(first, Err(FetchError::Timeout)));
        assert!(loader.complete(second, Ok(detail(3))));
    }

    #[tokio::test]
    async fn test_load_detail_from_missing_synopsis() {
        let mut loader = DetailLoader::new();
        let source = FixedSource(Ok(detail(42)));

        loader.load_detail_from(&source, 42).await;

        match loader.state() {
            DetailState::Ready(item) => assert_eq!(item.synopsis, "No synopsis available."),
            other => panic!("expected Ready, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_detail_from_timeout() {
        let mut loader = DetailLoader::new();
        let source = FixedSource(Err(FetchError::Timeout));

        loader.load_detail_from(&source, 9).await;

        assert_eq!(
            loader.state(),
            &DetailState::Failed {
                id: 9,
                message: "Request timed out".to_string()
            }
        );
    }
}
