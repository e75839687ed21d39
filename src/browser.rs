//! Async driver for a browsing session.
//!
//! Runs the effects returned by [`SessionState::apply`]: the index fetch is
//! awaited inline during `mount`/`reload`, content fetches are spawned so the
//! catalog stays interactive while a snippet loads.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::catalog::FolderPath;
use crate::catalog_loader::{load_index, CatalogState};
use crate::config::BrowserConfig;
use crate::content_loader::{ContentTicket, ContentView};
use crate::error::{ContentLoadError, FetchError};
use crate::explorer::TreeRow;
use crate::session::{Action, Effect, SessionState};
use crate::source::CatalogSource;

pub struct CatalogBrowser<S: CatalogSource> {
    source: Arc<S>,
    state: Arc<Mutex<SessionState>>,
    timeout: Duration,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bound a fetch; running out of time is reported as `FetchError::Timeout`.
async fn bounded<T, E, F>(limit: Duration, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<FetchError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(E::from(FetchError::Timeout(limit.as_secs()))),
    }
}

impl<S: CatalogSource> CatalogBrowser<S> {
    pub fn new(source: S, config: &BrowserConfig) -> Self {
        Self::with_shared_source(Arc::new(source), config)
    }

    pub fn with_shared_source(source: Arc<S>, config: &BrowserConfig) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(SessionState::new(config.content_fallback.clone()))),
            timeout: config.timeout(),
            in_flight: Mutex::new(None),
        }
    }

    /// Load the index. Only the first call on a session fetches anything.
    pub async fn mount(&self) -> CatalogState {
        self.dispatch(Action::Mount).await;
        self.catalog_status()
    }

    /// Replace the catalog with a freshly fetched one and reset the session.
    pub async fn reload(&self) -> CatalogState {
        self.abort_in_flight();
        self.dispatch(Action::Reload).await;
        self.catalog_status()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.apply(Action::SetQuery(query.into()));
    }

    /// Returns whether the folder is collapsed afterwards.
    pub fn toggle(&self, path: impl Into<FolderPath>) -> bool {
        let path = path.into();
        let mut state = lock(&self.state);
        state.apply(Action::ToggleFolder(path.clone()));
        state.collapse().is_collapsed(&path)
    }

    /// Select a leaf. Returns true when a content fetch was started.
    pub fn select(&self, leaf_path: impl Into<String>) -> bool {
        let effects = self.apply(Action::Select(leaf_path.into()));
        let mut started = false;
        for effect in effects {
            if let Effect::FetchContent(ticket) = effect {
                self.spawn_content(ticket);
                started = true;
            }
        }
        started
    }

    /// Wait for the latest content fetch, if any, to finish.
    pub async fn settle(&self) {
        let handle = lock(&self.in_flight).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn catalog_status(&self) -> CatalogState {
        lock(&self.state).catalog().clone()
    }

    pub fn rows(&self) -> Vec<TreeRow> {
        lock(&self.state).rows()
    }

    pub fn content(&self) -> Option<ContentView> {
        lock(&self.state).content_view()
    }

    pub fn is_content_loading(&self) -> bool {
        lock(&self.state).content().is_loading()
    }

    pub fn selection(&self) -> Option<String> {
        lock(&self.state).selection().map(str::to_string)
    }

    pub fn query(&self) -> String {
        lock(&self.state).query().raw().to_string()
    }

    fn apply(&self, action: Action) -> Vec<Effect> {
        lock(&self.state).apply(action)
    }

    async fn dispatch(&self, action: Action) {
        let mut queue: VecDeque<Effect> = self.apply(action).into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::FetchIndex(ticket) => {
                    tracing::info!("[CATALOG] Fetching index");
                    let result = bounded(self.timeout, load_index(self.source.as_ref())).await;
                    queue.extend(self.apply(Action::IndexResolved { ticket, result }));
                }
                Effect::FetchContent(ticket) => self.spawn_content(ticket),
            }
        }
    }

    fn spawn_content(&self, ticket: ContentTicket) {
        tracing::info!("[CONTENT] Loading {} (token {})", ticket.path, ticket.token);
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let limit = self.timeout;

        let handle = tokio::spawn(async move {
            let result = bounded(limit, source.fetch_content(&ticket.path))
                .await
                .map_err(|e| ContentLoadError::new(ticket.path.clone(), e));
            lock(&state).apply(Action::ContentResolved { ticket, result });
        });

        // The token check still guards commits if the old task already finished.
        if let Some(previous) = lock(&self.in_flight).replace(handle) {
            previous.abort();
        }
    }

    fn abort_in_flight(&self) {
        if let Some(previous) = lock(&self.in_flight).take() {
            previous.abort();
        }
    }
}

impl<S: CatalogSource> Drop for CatalogBrowser<S> {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::SAMPLE_INDEX;
    use crate::config::DEFAULT_CONTENT_FALLBACK;
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    type Reply = Result<String, FetchError>;

    /// In-memory source whose content replies are released by the test.
    struct ScriptedSource {
        index: Result<Vec<u8>, FetchError>,
        index_calls: AtomicUsize,
        pending: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    }

    impl ScriptedSource {
        fn new(index: Result<Vec<u8>, FetchError>) -> Self {
            Self {
                index,
                index_calls: AtomicUsize::new(0),
                pending: Mutex::new(HashMap::new()),
            }
        }

        fn with_sample() -> Self {
            Self::new(Ok(SAMPLE_INDEX.as_bytes().to_vec()))
        }

        /// Register a path; its fetch waits until the returned sender fires.
        fn hold(&self, path: &str) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            lock(&self.pending).insert(path.to_string(), rx);
            tx
        }
    }

    impl CatalogSource for ScriptedSource {
        fn fetch_index(&self) -> BoxFuture<'_, Result<Vec<u8>, FetchError>> {
            self.index_calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.index.clone();
            Box::pin(async move { reply })
        }

        fn fetch_content<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Reply> {
            let waiting = lock(&self.pending).remove(path);
            Box::pin(async move {
                match waiting {
                    Some(rx) => rx
                        .await
                        .unwrap_or_else(|_| Err(FetchError::Network("dropped".to_string()))),
                    None => Err(FetchError::Http {
                        status: 404,
                        url: format!("http://scripted/{path}"),
                    }),
                }
            })
        }
    }

    fn config(timeout_secs: u64) -> BrowserConfig {
        BrowserConfig {
            timeout_secs,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mount_fetches_index_once() {
        let source = Arc::new(ScriptedSource::with_sample());
        let browser = CatalogBrowser::with_shared_source(Arc::clone(&source), &config(5));

        assert!(matches!(browser.mount().await, CatalogState::Loaded(_)));
        browser.set_query("use");
        browser.select("basics/useState.js");
        browser.mount().await;

        assert_eq!(source.index_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_index_failure_blocks_catalog() {
        let source = ScriptedSource::new(Err(FetchError::Http {
            status: 500,
            url: "http://scripted/data/index.json".to_string(),
        }));
        let browser = CatalogBrowser::new(source, &config(5));

        match browser.mount().await {
            CatalogState::Failed(message) => assert!(message.contains("HTTP 500")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(browser.rows().is_empty());
        assert!(!browser.select("basics/useState.js"));
    }

    #[tokio::test]
    async fn test_malformed_index_fails_whole_view() {
        let source = ScriptedSource::new(Ok(br#"{"a": 1}"#.to_vec()));
        let browser = CatalogBrowser::new(source, &config(5));
        assert!(matches!(browser.mount().await, CatalogState::Failed(_)));
    }

    #[tokio::test]
    async fn test_later_selection_wins_when_earlier_resolves_last() {
        let source = Arc::new(ScriptedSource::with_sample());
        let browser = CatalogBrowser::with_shared_source(Arc::clone(&source), &config(5));
        browser.mount().await;

        let reply_a = source.hold("basics/useState.js");
        let reply_b = source.hold("data/custom/useFetch.js");

        assert!(browser.select("basics/useState.js"));
        assert!(browser.is_content_loading());
        assert!(browser.select("data/custom/useFetch.js"));

        let _ = reply_b.send(Ok("const b = 2;".to_string()));
        browser.settle().await;
        let _ = reply_a.send(Ok("const a = 1;".to_string()));
        tokio::task::yield_now().await;

        let view = browser.content().unwrap();
        assert_eq!(view.path, "data/custom/useFetch.js");
        assert_eq!(view.text, "const b = 2;");
        assert_eq!(view.language, "javascript");
        assert!(!browser.is_content_loading());
    }

    #[tokio::test]
    async fn test_content_404_shows_fallback() {
        let browser = CatalogBrowser::new(ScriptedSource::with_sample(), &config(5));
        browser.mount().await;

        assert!(browser.select("data/custom/useToggle.js"));
        browser.settle().await;

        let view = browser.content().unwrap();
        assert!(view.failed);
        assert_eq!(view.text, DEFAULT_CONTENT_FALLBACK);
        assert!(!browser.is_content_loading());

        browser.set_query("fetch");
        let rows = browser.rows();
        assert!(rows.iter().any(|r| r.name == "useFetch"));
        assert!(browser.select("data/custom/useFetch.js"));
        assert_eq!(browser.selection().as_deref(), Some("data/custom/useFetch.js"));
    }

    #[tokio::test]
    async fn test_slow_content_times_out() {
        let source = Arc::new(ScriptedSource::with_sample());
        let browser = CatalogBrowser::with_shared_source(Arc::clone(&source), &config(1));
        browser.mount().await;

        let _held = source.hold("basics/useState.js");
        assert!(browser.select("basics/useState.js"));
        browser.settle().await;

        let view = browser.content().unwrap();
        assert!(view.failed);
        assert!(!browser.is_content_loading());
    }

    #[tokio::test]
    async fn test_reload_refetches_and_resets() {
        let source = Arc::new(ScriptedSource::with_sample());
        let browser = CatalogBrowser::with_shared_source(Arc::clone(&source), &config(5));
        browser.mount().await;

        assert!(browser.toggle("basics"));
        browser.set_query("use");
        assert!(matches!(browser.reload().await, CatalogState::Loaded(_)));

        assert_eq!(source.index_calls.load(Ordering::SeqCst), 2);
        assert_eq!(browser.selection(), None);
        assert_eq!(browser.query(), "use");
        let rows = browser.rows();
        assert!(rows.iter().any(|r| r.name == "useState"));
    }
}
