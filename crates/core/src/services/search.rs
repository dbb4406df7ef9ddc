use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::models::{
    Facet, Movie, RequestSignature, SearchFilters, SearchParams, SearchSnapshot, SortOrder,
};
use crate::services::debounce::DebounceEvent;
use crate::services::gateway::MetadataGateway;

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Drop movies already present in the accumulated results when appending a page.
    /// Off by default: the gateway's ranking can shift between pages and the
    /// repeats are shown as-is.
    pub dedupe_by_id: bool,
}

/// What happened to a search operation's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response was applied to the results.
    Applied,
    /// The state changed while the request was out; the response was dropped.
    Stale,
    /// Nothing was requested.
    Skipped,
}

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    filters: SearchFilters,
    sort: SortOrder,
    results: Vec<Movie>,
    current_page: u32,
    total_pages: u32,
    /// Signature of the request whose response may still be applied.
    pending: Option<RequestSignature>,
}

impl SearchState {
    fn params(&self, page: u32) -> SearchParams {
        SearchParams {
            query: self.query.clone(),
            page,
            filters: self.filters,
            sort: self.sort,
        }
    }
}

/// Owns one search session: query text, facets, sort order, and the accumulated
/// pages of results.
///
/// Operations take `&self` and may overlap. The state lock is never held across a
/// gateway call; each response is checked against the pending request signature
/// before it touches the results.
pub struct SearchController {
    gateway: Arc<dyn MetadataGateway>,
    options: SearchOptions,
    state: Mutex<SearchState>,
}

impl SearchController {
    pub fn new(gateway: Arc<dyn MetadataGateway>) -> Self {
        Self::with_options(gateway, SearchOptions::default())
    }

    pub fn with_options(gateway: Arc<dyn MetadataGateway>, options: SearchOptions) -> Self {
        Self {
            gateway,
            options,
            state: Mutex::new(SearchState {
                current_page: 1,
                ..SearchState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SearchState> {
        // State is only mutated in short non-panicking sections.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        let state = self.lock();
        SearchSnapshot {
            query: state.query.clone(),
            filters: state.filters,
            sort: state.sort,
            results: state.results.clone(),
            current_page: state.current_page,
            total_pages: state.total_pages,
            loading: state.pending.is_some(),
        }
    }

    pub async fn set_query(&self, text: impl Into<String>) -> Result<SearchOutcome> {
        let text = text.into();
        let params = self.reset(|state| state.query = text);
        self.dispatch(params).await
    }

    pub async fn set_filter(&self, facet: Facet) -> Result<SearchOutcome> {
        let params = self.reset(|state| state.filters.apply(facet));
        self.dispatch(params).await
    }

    pub async fn set_sort(&self, sort: SortOrder) -> Result<SearchOutcome> {
        let params = self.reset(|state| state.sort = sort);
        self.dispatch(params).await
    }

    /// Unsets every facet and restores the default sort order.
    pub async fn clear_filters(&self) -> Result<SearchOutcome> {
        let params = self.reset(|state| {
            state.filters = SearchFilters::default();
            state.sort = SortOrder::default();
        });
        self.dispatch(params).await
    }

    /// Re-runs page 1 for the current state, as the search key does. Blank queries are ignored.
    pub async fn submit(&self) -> Result<SearchOutcome> {
        if self.lock().query.trim().is_empty() {
            return Ok(SearchOutcome::Skipped);
        }
        let params = self.reset(|_| {});
        self.dispatch(params).await
    }

    /// Routes a settled keystroke burst from the debouncer.
    pub async fn apply_debounced(&self, event: DebounceEvent) -> Result<SearchOutcome> {
        match event {
            DebounceEvent::Commit(text) => self.set_query(text).await,
            DebounceEvent::Clear => self.set_query(String::new()).await,
        }
    }

    /// Fetches the page after the current one and appends it.
    ///
    /// No-op while a request is out or once the last known page is loaded.
    pub async fn load_next_page(&self) -> Result<SearchOutcome> {
        let params = {
            let mut state = self.lock();
            if state.pending.is_some() || state.current_page >= state.total_pages {
                return Ok(SearchOutcome::Skipped);
            }

            let params = state.params(state.current_page + 1);
            state.pending = Some(params.signature());
            params
        };

        self.run(params).await
    }

    /// Applies `change`, then clears results and returns the page-1 request to send,
    /// if the query is non-empty. Any request still out becomes stale.
    fn reset(&self, change: impl FnOnce(&mut SearchState)) -> Option<SearchParams> {
        let mut state = self.lock();
        change(&mut state);

        state.results.clear();
        state.current_page = 1;
        state.total_pages = 0;

        if state.query.is_empty() {
            state.pending = None;
            return None;
        }

        let params = state.params(1);
        state.pending = Some(params.signature());
        Some(params)
    }

    async fn dispatch(&self, params: Option<SearchParams>) -> Result<SearchOutcome> {
        match params {
            Some(params) => self.run(params).await,
            None => Ok(SearchOutcome::Skipped),
        }
    }

    async fn run(&self, params: SearchParams) -> Result<SearchOutcome> {
        let signature = params.signature();
        tracing::debug!(
            query = %params.query,
            page = params.page,
            sort = params.sort.as_param(),
            "Searching movies"
        );

        let response = self.gateway.search_movies(&params).await;

        let mut state = self.lock();
        if state.pending.as_ref() != Some(&signature) {
            tracing::debug!(
                query = %params.query,
                page = params.page,
                "Dropping stale search response"
            );
            return Ok(SearchOutcome::Stale);
        }
        state.pending = None;

        match response {
            Ok(page) => {
                if params.page == 1 {
                    state.results = page.movies;
                } else if self.options.dedupe_by_id {
                    let seen: HashSet<i64> = state.results.iter().map(|m| m.id).collect();
                    state
                        .results
                        .extend(page.movies.into_iter().filter(|m| !seen.contains(&m.id)));
                } else {
                    state.results.extend(page.movies);
                }
                state.current_page = params.page;
                state.total_pages = page.total_pages;
                Ok(SearchOutcome::Applied)
            }
            Err(e) => {
                if params.page == 1 {
                    state.results.clear();
                    state.total_pages = 0;
                }
                tracing::warn!(
                    query = %params.query,
                    page = params.page,
                    error = %e,
                    "Search failed"
                );
                Err(e)
            }
        }
    }
}
