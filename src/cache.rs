// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process LRU cache for query results.
//!
//! Entries are keyed by [`QueryKey`] (resource kind + parameters) and hold the
//! last good value, when it was stored, and the last error. Values are
//! type-erased so one cache serves every resource kind; reads downcast back to
//! the caller's type.

use std::any::Any;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use lru::LruCache;

type CachedValue = Arc<dyn Any + Send + Sync>;

/// Composite cache key: resource kind plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    kind: &'static str,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new<I, S>(kind: &'static str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind)?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}

struct CacheEntry {
    value: Option<CachedValue>,
    updated_at: Option<Instant>,
    error: Option<String>,
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub data: Option<T>,
    /// When `data` was stored.
    pub updated_at: Option<Instant>,
    pub error: Option<String>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self {
            data: None,
            updated_at: None,
            error: None,
        }
    }
}

pub struct QueryCache {
    entries: Mutex<LruCache<QueryKey, CacheEntry>>,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Last good value for `key`, regardless of age.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.snapshot(key).data
    }

    pub fn snapshot<T: Clone + 'static>(&self, key: &QueryKey) -> Snapshot<T> {
        let Ok(mut entries) = self.entries.lock() else {
            return Snapshot::default();
        };
        match entries.get(key) {
            Some(entry) => Snapshot {
                data: entry
                    .value
                    .as_ref()
                    .and_then(|v| v.downcast_ref::<T>())
                    .cloned(),
                updated_at: entry.updated_at,
                error: entry.error.clone(),
            },
            None => Snapshot::default(),
        }
    }

    /// Store a good value, clearing any previous error.
    pub fn set<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                key.clone(),
                CacheEntry {
                    value: Some(Arc::new(value)),
                    updated_at: Some(Instant::now()),
                    error: None,
                },
            );
        }
    }

    /// Record a failure. The previous value, if any, is kept.
    pub fn set_error(&self, key: &QueryKey, message: impl Into<String>) {
        let message = message.into();
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(entry) = entries.get_mut(key) {
                entry.error = Some(message);
                return;
            }
            entries.put(
                key.clone(),
                CacheEntry {
                    value: None,
                    updated_at: None,
                    error: Some(message),
                },
            );
        }
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.entries
            .lock()
            .map(|mut entries| entries.pop(key).is_some())
            .unwrap_or(false)
    }

    /// Drop every entry of the given resource kind.
    pub fn invalidate_kind(&self, kind: &str) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let doomed: Vec<QueryKey> = entries
            .iter()
            .filter(|(key, _)| key.kind == kind)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
