//! Background fetch tasks
//!
//! Page and detail requests run on spawned tokio tasks so the UI keeps
//! drawing. Results come back over a channel tagged with the request that
//! produced them; the app decides whether they are still wanted.

use tokio::sync::mpsc;
use tracing::debug;

use topanime::catalog::PageRequest;
use topanime::data::{DetailItem, FetchError, JikanClient, Page};
use topanime::detail::DetailRequest;

/// Messages sent from background fetches to the main loop
#[derive(Debug)]
pub enum FetchMessage {
    /// A page request finished
    PageLoaded {
        request: PageRequest,
        result: Result<Page, FetchError>,
    },
    /// A detail request finished
    DetailLoaded {
        request: DetailRequest,
        result: Result<DetailItem, FetchError>,
    },
}

/// Work the app wants performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Page(PageRequest),
    Detail(DetailRequest),
}

/// Spawns fetches and collects their results
pub struct FetchHandle {
    /// Channel for receiving finished fetches
    receiver: mpsc::Receiver<FetchMessage>,
    sender: mpsc::Sender<FetchMessage>,
    client: JikanClient,
}

impl FetchHandle {
    pub fn new(client: JikanClient) -> Self {
        let (sender, receiver) = mpsc::channel(32);
        Self {
            receiver,
            sender,
            client,
        }
    }

    /// Starts `job` on a background task
    pub fn spawn(&self, job: Job) {
        let client = self.client.clone();
        let tx = self.sender.clone();

        match job {
            Job::Page(request) => {
                debug!(page = request.page, token = request.token, "Spawning page fetch");
                tokio::spawn(async move {
                    let result = client.top_anime(request.page).await;
                    let _ = tx.send(FetchMessage::PageLoaded { request, result }).await;
                });
            }
            Job::Detail(request) => {
                debug!(id = request.id, token = request.token, "Spawning detail fetch");
                tokio::spawn(async move {
                    let result = client.anime_detail(request.id).await;
                    let _ = tx.send(FetchMessage::DetailLoaded { request, result }).await;
                });
            }
        }
    }

    /// Returns a finished fetch without blocking, if one is pending
    pub fn try_recv(&mut self) -> Option<FetchMessage> {
        self.receiver.try_recv().ok()
    }
}
