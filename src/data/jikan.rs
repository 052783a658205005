//! Jikan API v4 client
//!
//! Fetches pages of the top anime list and single anime records, and maps the
//! loosely-typed JSON onto [`ListItem`] and [`DetailItem`].

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{AnimeKind, DetailItem, ListItem, NO_SYNOPSIS, PAGE_SIZE, UNKNOWN_AIRED};

/// Base URL for the Jikan API
pub const JIKAN_BASE_URL: &str = "https://api.jikan.moe/v4";

/// How long a single request may take before it is abandoned
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(7);

/// Errors that can occur when fetching from the API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not finish within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The API answered with a non-success HTTP status
    #[error("API {0}")]
    ServerStatus(u16),

    /// The body was not JSON or lacked the top-level `data` field
    #[error("Malformed response")]
    MalformedResponse,

    /// The request never reached the API (DNS, connection refused, ...)
    #[error("{0}")]
    Network(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// One page of the top list
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<ListItem>,
    /// True when the API returned fewer records than a full page
    ///
    /// A final page that is exactly [`PAGE_SIZE`] long is reported as not last;
    /// the next request then comes back empty.
    pub is_last_page: bool,
}

/// Something that can fetch pages of the top list
pub trait PageSource {
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

/// Something that can fetch a single anime record
pub trait DetailSource {
    fn fetch_detail(&self, id: u32) -> impl Future<Output = Result<DetailItem, FetchError>> + Send;
}

/// Runs `fut`, giving up with [`FetchError::Timeout`] once `limit` elapses
///
/// The future is dropped on timeout, which cancels any in-flight request.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    }
}

/// Response wrapper for `/top/anime`
#[derive(Debug, Deserialize)]
struct ListResponse {
    data: Option<Vec<RawAnime>>,
}

/// Response wrapper for `/anime/{id}`
#[derive(Debug, Deserialize)]
struct DetailResponse {
    data: Option<RawAnime>,
}

/// An anime record as the API sends it; every field may be missing
#[derive(Debug, Default, Deserialize)]
struct RawAnime {
    mal_id: Option<u32>,
    title: Option<String>,
    images: Option<RawImages>,
    #[serde(rename = "type")]
    kind: Option<String>,
    episodes: Option<u32>,
    score: Option<f64>,
    rank: Option<u32>,
    synopsis: Option<String>,
    aired: Option<RawAired>,
    genres: Option<Vec<RawGenre>>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawImages {
    jpg: Option<RawImageSet>,
}

#[derive(Debug, Default, Deserialize)]
struct RawImageSet {
    image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAired {
    string: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGenre {
    name: Option<String>,
}

impl RawAnime {
    fn image_url(&self) -> String {
        self.images
            .as_ref()
            .and_then(|images| images.jpg.as_ref())
            .and_then(|jpg| jpg.image_url.clone())
            .unwrap_or_default()
    }
}

/// Maps a top-list record, skipping records without an id
fn to_list_item(raw: RawAnime) -> Option<ListItem> {
    let Some(id) = raw.mal_id else {
        warn!(title = ?raw.title, "Skipping record without mal_id");
        return None;
    };
    let image_url = raw.image_url();

    Some(ListItem {
        id,
        title: raw.title.unwrap_or_default(),
        image_url,
        kind: AnimeKind::from_label(raw.kind.as_deref()),
        episodes: raw.episodes,
        score: raw.score,
        rank: raw.rank,
        synopsis: raw.synopsis.unwrap_or_else(|| NO_SYNOPSIS.to_string()),
    })
}

/// Maps a single-anime record; empty synopsis and aired strings count as missing
fn to_detail_item(raw: RawAnime) -> Option<DetailItem> {
    let id = raw.mal_id?;
    let image_url = raw.image_url();

    Some(DetailItem {
        id,
        title: raw.title.unwrap_or_default(),
        image_url,
        episodes: raw.episodes,
        score: raw.score,
        synopsis: raw
            .synopsis
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_SYNOPSIS.to_string()),
        aired: raw
            .aired
            .and_then(|aired| aired.string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_AIRED.to_string()),
        genres: raw
            .genres
            .unwrap_or_default()
            .into_iter()
            .filter_map(|genre| genre.name)
            .collect(),
        source_url: raw.url.unwrap_or_default(),
    })
}

/// Builds a page from raw records
///
/// The last-page check counts raw records, so skipped records still count
/// towards a full page.
fn page_from_records(records: Vec<RawAnime>) -> Page {
    let is_last_page = records.len() < PAGE_SIZE;
    let items = records.into_iter().filter_map(to_list_item).collect();
    Page {
        items,
        is_last_page,
    }
}

/// Client for the Jikan API
#[derive(Debug, Clone)]
pub struct JikanClient {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JikanClient {
    /// Creates a client for the public Jikan API with the default timeout
    pub fn new() -> Self {
        Self::with_base_url(JIKAN_BASE_URL)
    }

    /// Creates a client against a different base URL (mirror or test server)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replaces the underlying HTTP client
    pub fn with_http(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    /// Sets the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one page of the top anime list
    ///
    /// # Arguments
    /// * `page` - 1-based page index
    ///
    /// # Returns
    /// * `Ok(Page)` - Mapped items and the last-page flag
    /// * `Err(FetchError)` - Timeout, non-success status, malformed body or transport failure
    pub async fn top_anime(&self, page: u32) -> Result<Page, FetchError> {
        let response: ListResponse = self.get_json(&format!("/top/anime?page={}", page)).await?;
        let records = response.data.ok_or(FetchError::MalformedResponse)?;
        let page_data = page_from_records(records);

        info!(
            page,
            items = page_data.items.len(),
            last = page_data.is_last_page,
            "Fetched top anime page"
        );
        Ok(page_data)
    }

    /// Fetches the full record for one anime
    pub async fn anime_detail(&self, id: u32) -> Result<DetailItem, FetchError> {
        let response: DetailResponse = self.get_json(&format!("/anime/{}", id)).await?;
        let raw = response.data.ok_or(FetchError::MalformedResponse)?;
        let detail = to_detail_item(raw).ok_or(FetchError::MalformedResponse)?;

        debug!(id, title = %detail.title, "Fetched anime detail");
        Ok(detail)
    }

    /// Issues a GET under the timeout and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Making API request");

        with_deadline(self.timeout, async {
            let response = self.http.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                warn!(url = %url, status = %status, "Request failed");
                return Err(FetchError::ServerStatus(status.as_u16()));
            }

            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                warn!(url = %url, error = %e, "Failed to parse response");
                FetchError::MalformedResponse
            })
        })
        .await
    }
}

impl PageSource for JikanClient {
    fn fetch_page(&self, page: u32) -> impl Future<Output = Result<Page, FetchError>> + Send {
        self.top_anime(page)
    }
}

impl DetailSource for JikanClient {
    fn fetch_detail(&self, id: u32) -> impl Future<Output = Result<DetailItem, FetchError>> + Send {
        self.anime_detail(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const VALID_PAGE: &str = r#"{
        "pagination": {"last_visible_page": 1, "has_next_page": false},
        "data": [
            {
                "mal_id": 5114,
                "title": "Fullmetal Alchemist: Brotherhood",
                "images": {"jpg": {"image_url": "https://cdn.myanimelist.net/images/anime/1223/96541.jpg"}},
                "type": "TV",
                "episodes": 64,
                "score": 9.1,
                "rank": 1,
                "synopsis": "After a horrific alchemy experiment goes wrong..."
            },
            {
                "mal_id": 52991,
                "title": "Sousou no Frieren",
                "type": null,
                "episodes": null,
                "score": null,
                "rank": null
            },
            {
                "mal_id": 9999,
                "title": "Some Web Series",
                "type": "ONA"
            }
        ]
    }"#;

    const VALID_DETAIL: &str = r#"{
        "data": {
            "mal_id": 42,
            "url": "https://myanimelist.net/anime/42",
            "title": "Example",
            "images": {"jpg": {"image_url": "https://cdn.example/42.jpg"}},
            "episodes": 12,
            "score": 7.5,
            "aired": {"string": "Apr 3, 2009 to Jul 4, 2010"},
            "genres": [{"name": "Action"}, {"name": "Drama"}]
        }
    }"#;

    fn test_http() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Serves a single canned HTTP response on a local port
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}", addr)
    }

    /// Accepts a connection and never answers
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        format!("http://{}", addr)
    }

    fn raw_records(count: usize) -> Vec<RawAnime> {
        (0..count)
            .map(|i| RawAnime {
                mal_id: Some(i as u32 + 1),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_parse_valid_page() {
        let response: ListResponse = serde_json::from_str(VALID_PAGE).unwrap();
        let page = page_from_records(response.data.unwrap());

        assert_eq!(page.items.len(), 3);
        assert!(page.is_last_page);

        let first = &page.items[0];
        assert_eq!(first.id, 5114);
        assert_eq!(first.title, "Fullmetal Alchemist: Brotherhood");
        assert_eq!(
            first.image_url,
            "https://cdn.myanimelist.net/images/anime/1223/96541.jpg"
        );
        assert_eq!(first.kind, AnimeKind::Tv);
        assert_eq!(first.episodes, Some(64));
        assert_eq!(first.rank, Some(1));
        assert!((first.score.unwrap() - 9.1).abs() < 0.001);
    }

    #[test]
    fn test_missing_list_fields_map_to_sentinels() {
        let response: ListResponse = serde_json::from_str(VALID_PAGE).unwrap();
        let page = page_from_records(response.data.unwrap());
        let second = &page.items[1];

        assert_eq!(second.image_url, "");
        assert_eq!(second.kind, AnimeKind::Unknown);
        assert_eq!(second.episodes_label(), "?");
        assert_eq!(second.score_label(), "N/A");
        assert_eq!(second.rank, None);
        assert_eq!(second.synopsis, NO_SYNOPSIS);
        assert_eq!(page.items[2].kind, AnimeKind::Other("ONA".to_string()));
    }

    #[test]
    fn test_full_page_is_not_last() {
        assert!(!page_from_records(raw_records(PAGE_SIZE)).is_last_page);
        assert!(page_from_records(raw_records(PAGE_SIZE - 1)).is_last_page);
        assert!(page_from_records(Vec::new()).is_last_page);
    }

    #[test]
    fn test_records_without_id_are_skipped_but_counted() {
        let mut records = raw_records(PAGE_SIZE - 1);
        records.push(RawAnime::default());

        let page = page_from_records(records);
        assert_eq!(page.items.len(), PAGE_SIZE - 1);
        assert!(!page.is_last_page);
    }

    #[test]
    fn test_parse_valid_detail() {
        let response: DetailResponse = serde_json::from_str(VALID_DETAIL).unwrap();
        let detail = to_detail_item(response.data.unwrap()).unwrap();

        assert_eq!(detail.id, 42);
        assert_eq!(detail.title, "Example");
        assert_eq!(detail.aired, "Apr 3, 2009 to Jul 4, 2010");
        assert_eq!(detail.genres, vec!["Action", "Drama"]);
        assert_eq!(detail.source_url, "https://myanimelist.net/anime/42");
        assert_eq!(detail.synopsis, NO_SYNOPSIS);
    }

    #[test]
    fn test_detail_empty_strings_count_as_missing() {
        let raw = RawAnime {
            mal_id: Some(1),
            synopsis: Some(String::new()),
            aired: Some(RawAired {
                string: Some(String::new()),
            }),
            ..Default::default()
        };
        let detail = to_detail_item(raw).unwrap();

        assert_eq!(detail.synopsis, NO_SYNOPSIS);
        assert_eq!(detail.aired, UNKNOWN_AIRED);
        assert!(detail.genres.is_empty());
        assert_eq!(detail.source_url, "");
        assert_eq!(detail.score_label(), "N/A");
        assert_eq!(detail.episodes_label(), "?");
    }

    #[test]
    fn test_detail_without_id_is_rejected() {
        assert!(to_detail_item(RawAnime::default()).is_none());
    }

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(FetchError::Timeout.to_string(), "Request timed out");
        assert_eq!(FetchError::ServerStatus(503).to_string(), "API 503");
        assert_eq!(FetchError::MalformedResponse.to_string(), "Malformed response");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = JikanClient::with_base_url("http://localhost:8080/v4/");
        assert_eq!(client.base_url(), "http://localhost:8080/v4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_times_out() {
        let result: Result<(), FetchError> = with_deadline(DEFAULT_REQUEST_TIMEOUT, async {
            tokio::time::sleep(Duration::from_millis(7_500)).await;
            Ok(())
        })
        .await;

        assert_eq!(result, Err(FetchError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_passes_through_fast_results() {
        let result = with_deadline(DEFAULT_REQUEST_TIMEOUT, async {
            tokio::time::sleep(Duration::from_millis(6_000)).await;
            Ok::<_, FetchError>(7)
        })
        .await;

        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_top_anime_over_http() {
        let base_url = serve_once("200 OK", VALID_PAGE).await;
        let client = JikanClient::with_base_url(base_url).with_http(test_http());

        let page = client.top_anime(1).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.is_last_page);
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_server_status() {
        let base_url = serve_once("429 Too Many Requests", "{}").await;
        let client = JikanClient::with_base_url(base_url).with_http(test_http());

        assert_eq!(client.top_anime(1).await, Err(FetchError::ServerStatus(429)));
    }

    #[tokio::test]
    async fn test_missing_data_is_malformed() {
        let base_url = serve_once("200 OK", r#"{"status": 200}"#).await;
        let client = JikanClient::with_base_url(base_url).with_http(test_http());

        assert_eq!(client.top_anime(1).await, Err(FetchError::MalformedResponse));
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let base_url = serve_once("200 OK", "<html>maintenance</html>").await;
        let client = JikanClient::with_base_url(base_url).with_http(test_http());

        assert_eq!(client.anime_detail(42).await, Err(FetchError::MalformedResponse));
    }

    #[tokio::test]
    async fn test_detail_over_http() {
        let base_url = serve_once("200 OK", VALID_DETAIL).await;
        let client = JikanClient::with_base_url(base_url).with_http(test_http());

        let detail = client.fetch_detail(42).await.unwrap();
        assert_eq!(detail.id, 42);
        assert_eq!(detail.synopsis, NO_SYNOPSIS);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let base_url = serve_silence().await;
        let client = JikanClient::with_base_url(base_url)
            .with_http(test_http())
            .with_request_timeout(Duration::from_millis(100));

        assert_eq!(client.fetch_page(1).await, Err(FetchError::Timeout));
    }
}
