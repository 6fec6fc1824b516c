//! Optional request cache.
//!
//! Fetch helper for non-critical data (the staff overlay). It never panics
//! or propagates an error type the caller must handle specially: every call
//! resolves to an [`OptionalResult`].
//!
//! # Semantics
//!
//! - Entries are keyed by [`DayQuery`] (date, airport, operator, shift).
//! - A call for a key with a request already in flight joins that request
//!   instead of issuing a second one.
//! - Each request races a fixed timeout and the originating caller's
//!   cancellation token; whichever fires first drops the request.
//! - Timed-out or aborted entries are evicted at once so the next call
//!   retries. Successes and definite errors stay cached until
//!   [`OptionalRequestCache::invalidate`] or [`OptionalRequestCache::clear`].

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::BackendError;
use crate::models::DayQuery;

/// Why an optional fetch produced no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum OptionalFailure {
    /// Endpoint reported the data as not available.
    #[error("not_found")]
    NotFound,
    /// Endpoint answered with an error.
    #[error("http")]
    Http,
    /// Fixed timeout elapsed.
    #[error("timeout")]
    Timeout,
    /// Caller cancelled.
    #[error("aborted")]
    Aborted,
}

impl OptionalFailure {
    /// Whether the outcome says nothing about the data and must not be cached.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Aborted)
    }
}

impl From<&BackendError> for OptionalFailure {
    fn from(err: &BackendError) -> Self {
        match err {
            BackendError::NotFound(_) | BackendError::Unavailable => Self::NotFound,
            BackendError::Http { .. } | BackendError::Transport(_) => Self::Http,
        }
    }
}

/// Outcome of an optional fetch.
pub type OptionalResult<T> = Result<T, OptionalFailure>;

type SharedFetch<T> = Shared<BoxFuture<'static, OptionalResult<T>>>;

struct Entry<T: Clone> {
    generation: u64,
    fetch: SharedFetch<T>,
}

struct Entries<T: Clone> {
    map: HashMap<DayQuery, Entry<T>>,
    next_generation: u64,
}

/// Deduplicating, cancellable cache for optional fetches.
pub struct OptionalRequestCache<T: Clone> {
    entries: Mutex<Entries<T>>,
    timeout: Duration,
}

impl<T> OptionalRequestCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a cache with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                next_generation: 0,
            }),
            timeout,
        }
    }

    /// Fetches the value for `key`, joining or reusing an existing request.
    ///
    /// `request` is only invoked when no entry exists for the key. `cancel`
    /// aborts the underlying request when this caller started it; a caller
    /// that joined someone else's request only stops waiting.
    pub async fn fetch<F, Fut>(
        &self,
        key: &DayQuery,
        cancel: &CancellationToken,
        request: F,
    ) -> OptionalResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, BackendError>> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(OptionalFailure::Aborted);
        }

        let (generation, fetch, originator) = {
            let mut entries = self.entries.lock();
            match entries.map.get(key) {
                Some(entry) => {
                    debug!(%key, "joining optional request");
                    (entry.generation, entry.fetch.clone(), false)
                }
                None => {
                    let generation = entries.next_generation;
                    entries.next_generation += 1;
                    let fetch = guarded(request(), self.timeout, cancel.clone())
                        .boxed()
                        .shared();
                    entries.map.insert(
                        key.clone(),
                        Entry {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    debug!(%key, generation, "issuing optional request");
                    (generation, fetch, true)
                }
            }
        };

        let outcome = tokio::select! {
            biased;
            outcome = fetch => outcome,
            _ = cancel.cancelled() => {
                if originator {
                    self.evict(key, generation);
                }
                return Err(OptionalFailure::Aborted);
            }
        };

        if let Err(failure) = outcome {
            if failure.is_transient() {
                self.evict(key, generation);
            }
        }
        outcome
    }

    /// Drops the entry for a key, so the next fetch issues a new request.
    pub fn invalidate(&self, key: &DayQuery) {
        self.entries.lock().map.remove(key);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().map.clear();
    }

    /// Whether an entry (pending or settled) exists for a key.
    pub fn contains(&self, key: &DayQuery) -> bool {
        self.entries.lock().map.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self, key: &DayQuery, generation: u64) {
        let mut entries = self.entries.lock();
        if entries
            .map
            .get(key)
            .is_some_and(|e| e.generation == generation)
        {
            entries.map.remove(key);
            debug!(%key, generation, "evicted optional request");
        }
    }
}

/// Runs a request against the timeout and the originator's token.
async fn guarded<T, Fut>(request: Fut, limit: Duration, cancel: CancellationToken) -> OptionalResult<T>
where
    Fut: Future<Output = Result<T, BackendError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(OptionalFailure::Aborted),
        outcome = tokio::time::timeout(limit, request) => match outcome {
            Err(_) => Err(OptionalFailure::Timeout),
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(OptionalFailure::from(&err)),
        },
    }
}
