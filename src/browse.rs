//! Page-level browse state: search text, category and page reconciled into one paginated
//! listing.
//!
//! Every fetch takes a ticket from a monotonically increasing generation counter. A response is
//! applied only if its ticket is still the latest one issued, so a slow response for an older
//! query or category can never overwrite fresher results. In-flight requests are not cancelled.
use anyhow::Result;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::detail::MovieCard;
use crate::tmdb::{Category, Movie, Paged, TmdbApi};

pub const FETCH_FAILED_NOTICE: &str =
    "Failed to fetch movies. Please check your API key and try again.";
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// What happened to a browse request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Response merged into the listing.
    Applied,
    /// Response arrived after a newer request was issued and was dropped.
    Stale,
    /// Nothing was requested (no API key, no further page, or a request already loading).
    Skipped,
    /// Search input replaced by newer input before the debounce delay elapsed.
    Superseded,
    /// Request failed; the generic notice is set.
    Failed,
}

/// Lets only the last call within `delay` through.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    latest: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: AtomicU64::new(0),
        }
    }

    /// Waits out the delay and reports whether no newer call arrived meanwhile.
    pub async fn settle(&self) -> bool {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Supersedes every call still waiting out its delay.
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct BrowseState {
    query: String,
    category: Category,
    page: u32,
    total_pages: u32,
    movies: Vec<Movie>,
    loading: bool,
    notice: Option<String>,
    generation: u64,
}

impl BrowseState {
    fn is_searching(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

#[derive(Debug)]
struct PendingFetch {
    ticket: u64,
    page: u32,
    query: String,
    category: Category,
}

#[derive(Debug, Clone, Serialize)]
pub struct BrowseSnapshot {
    pub query: String,
    pub category: Category,
    pub category_label: &'static str,
    pub heading: String,
    pub page: u32,
    pub total_pages: u32,
    pub has_more: bool,
    pub loading: bool,
    pub result_count: usize,
    pub notice: Option<String>,
    pub movies: Vec<MovieCard>,
}

pub struct BrowseController {
    tmdb: Arc<dyn TmdbApi>,
    state: Mutex<BrowseState>,
    debouncer: Debouncer,
}

impl std::fmt::Debug for BrowseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowseController")
            .field("state", &self.state)
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

impl BrowseController {
    pub fn new(tmdb: Arc<dyn TmdbApi>, search_debounce: Duration) -> Self {
        Self {
            tmdb,
            state: Mutex::new(BrowseState {
                page: 1,
                ..BrowseState::default()
            }),
            debouncer: Debouncer::new(search_debounce),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BrowseState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> BrowseSnapshot {
        let state = self.lock();
        let heading = if state.is_searching() {
            format!("Search results for \"{}\"", state.query)
        } else {
            state.category.label().to_string()
        };
        BrowseSnapshot {
            query: state.query.clone(),
            category: state.category,
            category_label: state.category.label(),
            heading,
            page: state.page,
            total_pages: state.total_pages,
            has_more: state.page < state.total_pages,
            loading: state.loading,
            result_count: state.movies.len(),
            notice: state.notice.clone(),
            movies: state.movies.iter().map(MovieCard::from_movie).collect(),
        }
    }

    /// Debounced search. A non-empty query takes precedence over the category; an empty one
    /// returns to category browsing.
    pub async fn search(&self, text: &str) -> FetchOutcome {
        if !self.debouncer.settle().await {
            debug!(query = %text, "Search input superseded");
            return FetchOutcome::Superseded;
        }
        let text = text.to_string();
        self.run(move |state| {
            state.query = text;
            Some(1)
        })
        .await
    }

    /// Switches category, clearing the query and the accumulated listing. Search input still
    /// waiting on the debounce is dropped.
    pub async fn select_category(&self, category: Category) -> FetchOutcome {
        info!(category = %category, "Category selected");
        self.debouncer.cancel();
        self.run(move |state| {
            state.category = category;
            state.query.clear();
            state.movies.clear();
            state.page = 1;
            state.total_pages = 0;
            state.notice = None;
            Some(1)
        })
        .await
    }

    /// Appends the next page. Never requests past the last page or while a request is loading.
    pub async fn load_more(&self) -> FetchOutcome {
        self.run(|state| {
            if state.loading || state.page >= state.total_pages {
                return None;
            }
            Some(state.page + 1)
        })
        .await
    }

    /// Refetches page 1 of the current query or category.
    pub async fn refresh(&self) -> FetchOutcome {
        self.run(|_| Some(1)).await
    }

    /// Back to the empty welcome state, keeping the category. Pending searches and in-flight
    /// responses are discarded.
    pub fn reset(&self) {
        self.debouncer.cancel();
        let mut state = self.lock();
        state.generation += 1;
        state.query.clear();
        state.movies.clear();
        state.page = 1;
        state.total_pages = 0;
        state.loading = false;
        state.notice = None;
        debug!(generation = state.generation, "Browse state reset");
    }

    /// Applies `plan` to the state and, if it names a page, fetches it. Planning and ticket
    /// issue happen under one lock.
    async fn run<F>(&self, plan: F) -> FetchOutcome
    where
        F: FnOnce(&mut BrowseState) -> Option<u32>,
    {
        let pending = {
            let mut state = self.lock();
            let Some(page) = plan(&mut *state) else {
                return FetchOutcome::Skipped;
            };
            if !self.tmdb.has_api_key() {
                debug!("No API key set, skipping fetch");
                return FetchOutcome::Skipped;
            }
            state.generation += 1;
            state.loading = true;
            PendingFetch {
                ticket: state.generation,
                page,
                query: state.query.clone(),
                category: state.category,
            }
        };

        let mut guard = LoadingGuard {
            controller: self,
            ticket: pending.ticket,
            armed: true,
        };
        let result = self.request(&pending).await;
        guard.armed = false;

        let mut state = self.lock();
        if pending.ticket != state.generation {
            debug!(
                ticket = pending.ticket,
                latest = state.generation,
                page = pending.page,
                "Dropping stale browse response"
            );
            return FetchOutcome::Stale;
        }
        state.loading = false;
        match result {
            Ok(response) => {
                debug!(
                    page = pending.page,
                    results = response.results.len(),
                    total_pages = response.total_pages,
                    "Applying browse response"
                );
                if pending.page == 1 {
                    state.movies = response.results;
                } else {
                    state.movies.extend(response.results);
                }
                state.total_pages = response.total_pages;
                state.page = pending.page;
                state.notice = None;
                FetchOutcome::Applied
            }
            Err(e) => {
                error!("Failed to fetch movies: {:?}", e);
                state.notice = Some(FETCH_FAILED_NOTICE.to_string());
                FetchOutcome::Failed
            }
        }
    }

    async fn request(&self, pending: &PendingFetch) -> Result<Paged<Movie>> {
        let query = pending.query.trim();
        if !query.is_empty() {
            return self.tmdb.search_movies(query, pending.page).await;
        }
        self.tmdb
            .category_movies(pending.category, pending.page)
            .await
    }
}

/// Clears `loading` when a fetch future is dropped before its response lands, so an abandoned
/// request cannot block later load-mores.
struct LoadingGuard<'a> {
    controller: &'a BrowseController,
    ticket: u64,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.controller.lock();
        if state.generation == self.ticket {
            debug!(ticket = self.ticket, "Browse request abandoned");
            state.loading = false;
        }
    }
}
