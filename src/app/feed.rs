use anyhow::Result;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::app::posts::PostService;
use crate::app::search::SearchController;
use crate::domain::post::{Page, Post};
use crate::infra::cache::{QueryCache, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page with this many posts was appended.
    Appended(usize),
    /// The backend returned an empty block; nothing appended, feed done.
    EndReached,
    /// A fetch was already in flight; no request was issued.
    AlreadyFetching,
    /// `has_next_page` was already false; no request was issued.
    Exhausted,
    /// The search overlay is active; pagination is bypassed.
    SearchActive,
}

struct PagerState {
    pages: Vec<Page>,
    has_next_page: bool,
    fetching: bool,
}

/// Cursor-paged, append-only view of the global feed, ordered by last
/// update descending. Driven by a scroll sentinel; the in-flight guard
/// makes rapid repeated triggers collapse into a single request.
pub struct FeedPager {
    posts: PostService,
    cache: QueryCache,
    page_size: i64,
    state: Mutex<PagerState>,
}

impl FeedPager {
    pub fn new(posts: PostService, cache: QueryCache, page_size: i64) -> Self {
        Self {
            posts,
            cache,
            page_size,
            state: Mutex::new(PagerState {
                pages: Vec::new(),
                has_next_page: true,
                fetching: false,
            }),
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.lock().has_next_page
    }

    pub fn is_fetching(&self) -> bool {
        self.lock().fetching
    }

    pub fn pages(&self) -> Vec<Page> {
        self.lock().pages.clone()
    }

    /// All loaded posts in page order.
    pub fn loaded_posts(&self) -> Vec<Post> {
        self.lock()
            .pages
            .iter()
            .flat_map(|page| page.posts().iter().cloned())
            .collect()
    }

    pub fn total_loaded(&self) -> usize {
        self.lock().pages.iter().map(Page::len).sum()
    }

    /// Fetches the next block and appends it. No-ops (without touching
    /// the backend) while a fetch is in flight or after the end was
    /// reached. A transport failure surfaces the error and leaves the
    /// loaded pages untouched; a stale feed beats a blank one.
    pub async fn fetch_next_page(&self) -> Result<FetchOutcome> {
        let cursor = {
            let mut state = self.lock();
            if state.fetching {
                return Ok(FetchOutcome::AlreadyFetching);
            }
            if !state.has_next_page {
                return Ok(FetchOutcome::Exhausted);
            }
            state.fetching = true;
            state.pages.last().map(|page| page.cursor().to_string())
        };

        let fetched = self.posts.feed_page(cursor.as_deref(), self.page_size).await;

        let outcome = {
            let mut state = self.lock();
            state.fetching = false;
            let list = match fetched {
                Ok(list) => list,
                Err(err) => return Err(err),
            };

            let count = list.documents.len();
            // A short page means the collection is drained; an empty one
            // is the degenerate case and is not appended.
            if (count as i64) < self.page_size {
                state.has_next_page = false;
            }
            match Page::from_posts(list.documents) {
                Some(page) => {
                    debug!(count, cursor = page.cursor(), "feed page appended");
                    state.pages.push(page);
                    FetchOutcome::Appended(count)
                }
                None => FetchOutcome::EndReached,
            }
        };

        if let FetchOutcome::Appended(_) = outcome {
            self.cache.put(QueryKey::InfinitePosts, &self.loaded_posts());
        }
        Ok(outcome)
    }

    fn lock(&self) -> MutexGuard<'_, PagerState> {
        self.state.lock().expect("pager state poisoned")
    }
}

/// The explore screen, headless: infinite feed with a search overlay.
/// While the query string is non-empty the pager is bypassed entirely:
/// the scroll sentinel does nothing and `visible_posts` shows search
/// results. Clearing the query re-enables pagination.
pub struct ExploreFeed {
    pager: FeedPager,
    search: SearchController,
}

impl ExploreFeed {
    pub fn new(pager: FeedPager, search: SearchController) -> Self {
        Self { pager, search }
    }

    pub fn pager(&self) -> &FeedPager {
        &self.pager
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    /// Scroll-sentinel handler: fetch the next page unless searching.
    pub async fn on_scroll_sentinel(&self) -> Result<FetchOutcome> {
        if self.search.is_active() {
            return Ok(FetchOutcome::SearchActive);
        }
        self.pager.fetch_next_page().await
    }

    pub fn set_search_query(&self, text: &str) {
        self.search.set_query(text);
    }

    /// What the screen shows: search results while a query is active
    /// (empty until the debounced call settles), the loaded feed
    /// otherwise.
    pub fn visible_posts(&self) -> Vec<Post> {
        if self.search.is_active() {
            self.search.results().unwrap_or_default()
        } else {
            self.pager.loaded_posts()
        }
    }
}
