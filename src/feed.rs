// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Feed
//!
//! Paginated view over `GET /api/tokens`. Pages are requested from page 1
//! upward and concatenated in page order; a later page never removes or
//! reorders items already loaded. No de-duplication is done across pages.
//!
//! Each page goes through the query layer under its own key, so page fetches
//! are cached and single-flight like any other read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::api::BackendClient;
use crate::cache::QueryKey;
use crate::error::READ_FALLBACK_MESSAGE;
use crate::models::{Pagination, Token, TokenPage};
use crate::query::{fetcher, Query, QueryClient};

pub const TOKENS_KIND: &str = "tokens";

#[derive(Default)]
struct FeedState {
    pages: Vec<TokenPage>,
    error: Option<String>,
}

impl FeedState {
    fn last_pagination(&self) -> Option<&Pagination> {
        self.pages.last().map(|page| &page.pagination)
    }
}

/// What a caller sees of the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub items: Vec<Token>,
    pub pages_loaded: usize,
    pub current_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub is_fetching_next_page: bool,
    pub error: Option<String>,
}

pub struct TokenFeed {
    api: BackendClient,
    queries: QueryClient,
    limit: u32,
    state: Mutex<FeedState>,
    fetching: AtomicBool,
}

/// Clears the in-flight flag even if the fetch future is dropped.
struct FetchGuard<'a>(&'a AtomicBool);

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TokenFeed {
    /// Take the in-flight flag, or `None` if another fetch holds it.
    fn try_claim(&self) -> Option<FetchGuard<'_>> {
        self.fetching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FetchGuard(&self.fetching))
    }

    pub fn new(api: BackendClient, queries: QueryClient, limit: u32) -> Self {
        Self {
            api,
            queries,
            limit: limit.max(1),
            state: Mutex::new(FeedState::default()),
            fetching: AtomicBool::new(false),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn page_query(&self, page: u32) -> Query<TokenPage> {
        let api = self.api.clone();
        let limit = self.limit;
        let key = QueryKey::new(TOKENS_KIND, [page.to_string(), limit.to_string()]);
        self.queries.query(
            Some(key),
            fetcher(move || {
                let api = api.clone();
                async move { api.list_tokens(page, limit).await }
            }),
        )
    }

    /// Load page 1 if nothing is loaded yet.
    pub async fn load(&self) -> FeedSnapshot {
        let empty = self
            .state
            .lock()
            .map(|state| state.pages.is_empty())
            .unwrap_or(false);
        if empty {
            self.fetch_next_page().await;
        }
        self.snapshot()
    }

    /// Fetch the page after the last loaded one.
    ///
    /// No-op (returns `false`) when the last page reported no next page or a
    /// page fetch or refetch is already running.
    pub async fn fetch_next_page(&self) -> bool {
        let Some(_guard) = self.try_claim() else {
            tracing::debug!("page fetch already running");
            return false;
        };

        // Read after claiming so no other fetch can move the last page.
        let next = {
            let Ok(state) = self.state.lock() else {
                return false;
            };
            match state.last_pagination() {
                None => 1,
                Some(p) if p.has_next_page => p.current_page + 1,
                Some(_) => return false,
            }
        };

        let query = self.page_query(next);
        let result = query.get().await;

        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        match result.data {
            Some(page) => {
                if page.pagination.current_page as usize != state.pages.len() + 1 {
                    tracing::warn!(
                        expected = state.pages.len() + 1,
                        got = page.pagination.current_page,
                        "backend returned an unexpected page"
                    );
                    state.error = Some(READ_FALLBACK_MESSAGE.to_string());
                    query.invalidate();
                    return false;
                }
                tracing::debug!(page = next, items = page.tokens.len(), "token page loaded");
                state.pages.push(page);
                state.error = None;
                true
            }
            None => {
                state.error = result.error;
                false
            }
        }
    }

    /// Re-request every loaded page in order. On any failure the loaded pages
    /// are kept and only the error is set.
    ///
    /// Holds the same flag as [`fetch_next_page`](Self::fetch_next_page), so
    /// the two never interleave; a refetch requested while a page fetch runs
    /// returns the current snapshot unchanged.
    pub async fn refetch(&self) -> FeedSnapshot {
        let empty = self
            .state
            .lock()
            .map(|state| state.pages.is_empty())
            .unwrap_or(true);
        if empty {
            return self.load().await;
        }

        let Some(guard) = self.try_claim() else {
            tracing::debug!("page fetch running, refetch skipped");
            return self.snapshot();
        };

        let loaded = self
            .state
            .lock()
            .map(|state| state.pages.len() as u32)
            .unwrap_or(0);

        let mut refreshed = Vec::with_capacity(loaded as usize);
        for page in 1..=loaded {
            let result = self.page_query(page).refetch().await;
            match (result.data, result.error) {
                (Some(data), None) => refreshed.push(data),
                (_, error) => {
                    tracing::warn!(page, ?error, "token page refetch failed");
                    if let Ok(mut state) = self.state.lock() {
                        state.error = error.or_else(|| Some(READ_FALLBACK_MESSAGE.to_string()));
                    }
                    drop(guard);
                    return self.snapshot();
                }
            }
        }

        if let Ok(mut state) = self.state.lock() {
            // Keep only the prefix that is still consistent with the server.
            let mut pages = Vec::with_capacity(refreshed.len());
            for page in refreshed {
                let has_next = page.pagination.has_next_page;
                pages.push(page);
                if !has_next {
                    break;
                }
            }
            state.pages = pages;
            state.error = None;
        }
        drop(guard);
        self.snapshot()
    }

    pub fn items(&self) -> Vec<Token> {
        self.state
            .lock()
            .map(|state| {
                state
                    .pages
                    .iter()
                    .flat_map(|page| page.tokens.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_next_page(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.last_pagination().is_some_and(|p| p.has_next_page))
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let is_fetching_next_page = self.fetching.load(Ordering::Acquire);
        let Ok(state) = self.state.lock() else {
            return FeedSnapshot {
                items: Vec::new(),
                pages_loaded: 0,
                current_page: 0,
                total_pages: 0,
                has_next_page: false,
                has_previous_page: false,
                is_fetching_next_page,
                error: None,
            };
        };

        let pagination = state.last_pagination();
        FeedSnapshot {
            items: state
                .pages
                .iter()
                .flat_map(|page| page.tokens.iter().cloned())
                .collect(),
            pages_loaded: state.pages.len(),
            current_page: pagination.map_or(0, |p| p.current_page),
            total_pages: pagination.map_or(0, |p| p.total_pages),
            has_next_page: pagination.is_some_and(|p| p.has_next_page),
            has_previous_page: pagination.is_some_and(|p| p.has_previous_page),
            is_fetching_next_page,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::api::testing::{spawn, token_address, FakeBackend};
    use crate::query::QueryOptions;

    async fn feed(total_tokens: usize, limit: u32) -> (TokenFeed, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend {
            total_tokens,
            ..Default::default()
        });
        let url = spawn(Arc::clone(&backend)).await;
        let api = BackendClient::new(&url, Duration::from_secs(5)).unwrap();
        let queries = QueryClient::new(QueryOptions {
            retry: 0,
            ..Default::default()
        });
        (TokenFeed::new(api, queries, limit), backend)
    }

    #[tokio::test]
    async fn pages_accumulate_in_order() {
        let (feed, _) = feed(7, 3).await;

        let first = feed.load().await;
        assert_eq!(first.items.len(), 3);
        assert!(first.has_next_page);

        assert!(feed.fetch_next_page().await);
        assert!(feed.fetch_next_page().await);

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.items.len(), 7);
        assert_eq!(snapshot.pages_loaded, 3);
        assert!(!snapshot.has_next_page);
        assert!(snapshot.has_previous_page);

        let addresses: Vec<String> = snapshot.items.iter().map(|t| t.address.clone()).collect();
        let expected: Vec<String> = (0..7).map(token_address).collect();
        assert_eq!(addresses, expected);
    }

    #[tokio::test]
    async fn fetch_next_page_is_noop_after_last_page() {
        let (feed, backend) = feed(2, 5).await;

        feed.load().await;
        let requests = backend.token_requests.load(Ordering::SeqCst);

        assert!(!feed.fetch_next_page().await);
        assert_eq!(backend.token_requests.load(Ordering::SeqCst), requests);
        assert_eq!(feed.items().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_next_page_calls_fetch_once() {
        let (feed, backend) = feed(10, 2).await;
        feed.load().await;

        let (a, b) = tokio::join!(feed.fetch_next_page(), feed.fetch_next_page());
        assert!(a ^ b);
        assert_eq!(feed.snapshot().pages_loaded, 2);
        assert_eq!(backend.token_requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let (feed, backend) = feed(4, 2).await;
        feed.load().await;
        feed.load().await;
        assert_eq!(feed.items().len(), 2);
        assert_eq!(backend.token_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_list_has_no_next_page() {
        let (feed, _) = feed(0, 5).await;
        let snapshot = feed.load().await;
        assert!(snapshot.items.is_empty());
        assert!(!snapshot.has_next_page);
        assert!(!feed.fetch_next_page().await);
    }

    #[tokio::test]
    async fn refetch_keeps_loaded_pages() {
        let (feed, backend) = feed(6, 2).await;
        feed.load().await;
        feed.fetch_next_page().await;

        let snapshot = feed.refetch().await;
        assert_eq!(snapshot.pages_loaded, 2);
        assert_eq!(snapshot.items.len(), 4);
        assert_eq!(backend.token_requests.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn refetch_and_next_page_never_drop_pages() {
        let (feed, _) = feed(10, 2).await;
        feed.load().await;
        feed.fetch_next_page().await;

        let (_, fetched) = tokio::join!(feed.refetch(), feed.fetch_next_page());

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.pages_loaded, 2 + usize::from(fetched));
        assert_eq!(snapshot.items.len(), snapshot.pages_loaded * 2);
        assert!(snapshot.error.is_none());
        assert!(!snapshot.is_fetching_next_page);

        let (fetched, _) = tokio::join!(feed.fetch_next_page(), feed.refetch());
        let before = snapshot.pages_loaded;
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.pages_loaded, before + usize::from(fetched));
        let expected: Vec<String> = (0..snapshot.items.len()).map(token_address).collect();
        let addresses: Vec<String> = snapshot.items.iter().map(|t| t.address.clone()).collect();
        assert_eq!(addresses, expected);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_pages_and_sets_error() {
        let (feed, backend) = feed(6, 2).await;
        feed.load().await;
        feed.fetch_next_page().await;

        backend.fail_tokens.store(true, Ordering::SeqCst);
        let snapshot = feed.refetch().await;
        assert_eq!(snapshot.pages_loaded, 2);
        assert_eq!(snapshot.items.len(), 4);
        assert_eq!(snapshot.error.as_deref(), Some("Token service unavailable"));

        backend.fail_tokens.store(false, Ordering::SeqCst);
        let snapshot = feed.refetch().await;
        assert_eq!(snapshot.pages_loaded, 2);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn out_of_order_page_is_rejected() {
        let (feed, backend) = feed(6, 2).await;
        feed.load().await;

        *backend.stuck_page.lock().unwrap() = Some(1);
        assert!(!feed.fetch_next_page().await);
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.pages_loaded, 1);
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.error.as_deref(), Some(READ_FALLBACK_MESSAGE));

        // The rejected response is not served from cache on the next attempt.
        *backend.stuck_page.lock().unwrap() = None;
        assert!(feed.fetch_next_page().await);
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.pages_loaded, 2);
        assert!(snapshot.error.is_none());
    }
}
