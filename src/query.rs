// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Query Layer
//!
//! Read operations are exposed as [`Query`] handles: a cache key plus the
//! fetcher that produces the value. All queries share one policy:
//!
//! - **Gating**: a handle built without a key (missing or malformed
//!   parameters) is disabled. It never calls its fetcher and reports
//!   `data = None, is_loading = false, error = None`.
//! - **Staleness**: a cached value younger than `stale_time` is served as-is.
//!   An older one is served immediately while a background refetch runs.
//! - **Single-flight**: concurrent fetches of one key share a single
//!   underlying call and observe the same outcome.
//! - **Retry**: transport-class failures are retried `retry` times.
//! - **Failures**: stored beside the entry as a normalized message. A failed
//!   refetch never clears previously good data.
//!
//! Fetches run as spawned tasks. A caller that stops awaiting does not abort
//! the request; its result still lands in the cache.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::cache::{QueryCache, QueryKey};
use crate::config::DEFAULT_STALE_TIME;
use crate::error::{ClientError, READ_FALLBACK_MESSAGE};

/// Default number of cached entries.
const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Default pause before the automatic retry.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Produces a fresh value for one query key.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<(), ClientError>>>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<T, F, Fut>(f: F) -> Fetcher<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub stale_time: Duration,
    /// Automatic retries after the first failed attempt.
    pub retry: u32,
    pub retry_delay: Duration,
    pub cache_capacity: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            retry: 1,
            retry_delay: DEFAULT_RETRY_DELAY,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// What a caller sees for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    /// No data yet and a fetch is in flight.
    pub is_loading: bool,
    /// A fetch is in flight (initial or background).
    pub is_fetching: bool,
    pub error: Option<String>,
}

impl<T> QueryState<T> {
    /// State of a query whose parameters are missing or malformed.
    pub fn disabled() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fetching: false,
            error: None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        QueryState {
            data: self.data.map(f),
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            error: self.error,
        }
    }
}

struct Inner {
    cache: QueryCache,
    in_flight: Mutex<HashMap<QueryKey, SharedFetch>>,
    options: QueryOptions,
}

/// Shared cache plus in-flight registry. Clones share state.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl QueryClient {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: QueryCache::new(options.cache_capacity),
                in_flight: Mutex::new(HashMap::new()),
                options,
            }),
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn options(&self) -> &QueryOptions {
        &self.inner.options
    }

    /// Build a handle. `key = None` yields a disabled query.
    pub fn query<T>(&self, key: Option<QueryKey>, fetcher: Fetcher<T>) -> Query<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        Query {
            client: self.clone(),
            key,
            fetcher,
        }
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .in_flight
            .lock()
            .map(|in_flight| in_flight.contains_key(key))
            .unwrap_or(false)
    }

    fn state<T: Clone + 'static>(&self, key: &QueryKey) -> QueryState<T> {
        let snapshot = self.inner.cache.snapshot::<T>(key);
        let is_fetching = self.is_fetching(key);
        QueryState {
            is_loading: is_fetching && snapshot.data.is_none(),
            is_fetching,
            data: snapshot.data,
            error: snapshot.error,
        }
    }

    async fn fetch<T>(&self, key: &QueryKey, fetcher: &Fetcher<T>, force: bool) -> QueryState<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let snapshot = self.inner.cache.snapshot::<T>(key);

        if snapshot.data.is_some() && !force {
            let fresh = snapshot
                .updated_at
                .is_some_and(|at| at.elapsed() < self.inner.options.stale_time);
            if !fresh {
                tracing::debug!(%key, "serving stale value, revalidating");
                drop(self.start_fetch(key, fetcher));
            }
            return self.state(key);
        }

        // The outcome is read back from the cache; errors are already stored.
        let _ = self.start_fetch(key, fetcher).await;
        self.state(key)
    }

    /// Join the in-flight fetch for `key`, or spawn one.
    fn start_fetch<T>(&self, key: &QueryKey, fetcher: &Fetcher<T>) -> SharedFetch
    where
        T: Clone + Send + Sync + 'static,
    {
        let Ok(mut in_flight) = self.inner.in_flight.lock() else {
            return futures::future::ready(Err(ClientError::Unexpected(
                "query registry poisoned".to_string(),
            )))
            .boxed()
            .shared();
        };

        if let Some(existing) = in_flight.get(key) {
            return existing.clone();
        }

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let fetcher = Arc::clone(fetcher);

        // The registry lock is held until the entry is inserted, so the task
        // cannot remove it first.
        let handle = tokio::spawn(async move {
            let mut slot = InFlightSlot {
                inner: Arc::clone(&inner),
                key: task_key.clone(),
                settled: false,
            };
            let result = fetch_with_retry(&task_key, &fetcher, &inner.options).await;
            let outcome = match result {
                Ok(value) => {
                    inner.cache.set(&task_key, value);
                    Ok(())
                }
                Err(err) => {
                    tracing::warn!(key = %task_key, error = %err, "query failed");
                    inner
                        .cache
                        .set_error(&task_key, err.user_message(READ_FALLBACK_MESSAGE));
                    Err(err)
                }
            };
            slot.settled = true;
            outcome
        });

        let shared = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ClientError::Unexpected(e.to_string())))
        }
        .boxed()
        .shared();

        in_flight.insert(key.clone(), shared.clone());
        shared
    }
}

/// Frees a key's in-flight entry when its fetch task ends, including by panic
/// or runtime shutdown. An unsettled task records a failure for the key.
struct InFlightSlot {
    inner: Arc<Inner>,
    key: QueryKey,
    settled: bool,
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        if !self.settled {
            tracing::error!(key = %self.key, "query fetch aborted");
            self.inner.cache.set_error(&self.key, READ_FALLBACK_MESSAGE);
        }
        if let Ok(mut in_flight) = self.inner.in_flight.lock() {
            in_flight.remove(&self.key);
        }
    }
}

async fn fetch_with_retry<T>(
    key: &QueryKey,
    fetcher: &Fetcher<T>,
    options: &QueryOptions,
) -> Result<T, ClientError> {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < options.retry => {
                attempt += 1;
                tracing::debug!(%key, attempt, error = %err, "retrying query");
                tokio::time::sleep(options.retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// A read operation bound to its cache key.
pub struct Query<T> {
    client: QueryClient,
    key: Option<QueryKey>,
    fetcher: Fetcher<T>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            key: self.key.clone(),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<T> Query<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn key(&self) -> Option<&QueryKey> {
        self.key.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Current state without starting a fetch.
    pub fn state(&self) -> QueryState<T> {
        match &self.key {
            Some(key) => self.client.state(key),
            None => QueryState::disabled(),
        }
    }

    /// Serve from cache when fresh, otherwise fetch.
    pub async fn get(&self) -> QueryState<T> {
        match &self.key {
            Some(key) => self.client.fetch(key, &self.fetcher, false).await,
            None => QueryState::disabled(),
        }
    }

    /// Fetch regardless of freshness and wait for the result.
    pub async fn refetch(&self) -> QueryState<T> {
        match &self.key {
            Some(key) => self.client.fetch(key, &self.fetcher, true).await,
            None => QueryState::disabled(),
        }
    }

    /// Drop the cached entry so the next `get` fetches.
    pub fn invalidate(&self) {
        if let Some(key) = &self.key {
            self.client.cache().invalidate(key);
        }
    }
}
