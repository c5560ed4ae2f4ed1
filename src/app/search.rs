use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

use crate::domain::post::Post;
use crate::infra::cache::{QueryCache, QueryKey};
use crate::infra::documents::Documents;

/// Debounced caption search. `set_query` is called on every keystroke;
/// keystrokes within the debounce window supersede each other so exactly
/// one backend call fires, with the last value typed. A generation token
/// guards both the timer and the response: a superseded timer never
/// issues a request, and a late response for a stale query is discarded,
/// so visible results always belong to the latest query.
#[derive(Clone)]
pub struct SearchController {
    inner: Arc<SearchInner>,
}

struct SearchInner {
    documents: Documents,
    cache: QueryCache,
    collection_id: String,
    debounce: Duration,
    generation: AtomicU64,
    state: Mutex<SearchState>,
}

#[derive(Default)]
struct SearchState {
    query: String,
    results: Option<Vec<Post>>,
    fetching: bool,
}

impl SearchController {
    pub fn new(
        documents: Documents,
        cache: QueryCache,
        collection_id: String,
        debounce_ms: u64,
    ) -> Self {
        Self {
            inner: Arc::new(SearchInner {
                documents,
                cache,
                collection_id,
                debounce: Duration::from_millis(debounce_ms),
                generation: AtomicU64::new(0),
                state: Mutex::new(SearchState::default()),
            }),
        }
    }

    /// A search is active while the query string is non-empty; the feed
    /// pager is bypassed for its duration.
    pub fn is_active(&self) -> bool {
        !self.inner.lock().query.is_empty()
    }

    pub fn query(&self) -> String {
        self.inner.lock().query.clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.lock().fetching
    }

    /// Results for the latest settled query; `None` while nothing has
    /// settled yet (or after the query was cleared).
    pub fn results(&self) -> Option<Vec<Post>> {
        self.inner.lock().results.clone()
    }

    /// Keystroke entry point. Must be called on a tokio runtime; the
    /// debounce timer runs as a spawned task.
    pub fn set_query(&self, text: &str) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.inner.lock();
            state.query = text.to_string();
            if text.is_empty() {
                state.results = None;
                state.fetching = false;
                return;
            }
            state.fetching = true;
        }

        let inner = Arc::clone(&self.inner);
        let term = text.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }

            let key = QueryKey::SearchPosts(term.clone());
            if let Some(cached) = inner.cache.get::<Vec<Post>>(&key) {
                inner.settle(generation, cached);
                return;
            }

            let result = inner
                .documents
                .search::<Post>(&inner.collection_id, "caption", &term)
                .await;
            match result {
                Ok(list) => {
                    inner.cache.put(key, &list.documents);
                    inner.settle(generation, list.documents);
                }
                Err(err) => {
                    warn!(%term, error = %err, "search failed");
                    inner.settle(generation, Vec::new());
                }
            }
        });
    }
}

impl SearchInner {
    fn lock(&self) -> MutexGuard<'_, SearchState> {
        self.state.lock().expect("search state poisoned")
    }

    fn settle(&self, generation: u64, results: Vec<Post>) {
        let mut state = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        state.fetching = false;
        state.results = Some(results);
    }
}
