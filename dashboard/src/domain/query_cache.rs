//! Process-wide cache of entity lists.
//!
//! Each [`CacheKey`] maps to the last server-fetched collection plus a stale
//! flag. Entries change only when a fetch completes (replace) or when the key
//! is invalidated (mark stale, then refetch after a short window).
//!
//! Ordering: every fetch draws a sequence number when it starts. A result is
//! applied only if its number exceeds the last applied one, so a slow fetch
//! started before an invalidation can never overwrite data from a fetch
//! started after it. Such a result may still fill an empty entry, but the
//! entry stays stale.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::Error;
use crate::domain::entities::EntityKind;
use crate::domain::ports::CacheKey;

/// Default delay between an invalidation and its refetch. Invalidations
/// landing inside the window share one refetch.
pub const DEFAULT_INVALIDATION_WINDOW: Duration = Duration::from_millis(16);

/// Produces the network call that fills one cache entry.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, Error>> + Send + Sync>;

/// What a view sees for one key.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// Last successfully fetched collection.
    pub data: Option<Arc<Vec<T>>>,
    /// A fetch for this key is in flight.
    pub is_loading: bool,
    /// Failure of the most recent applied fetch.
    pub error: Option<Error>,
    /// The data predates an invalidation.
    pub is_stale: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            is_stale: false,
        }
    }
}

impl<T> QueryState<T> {
    /// Fetched items, or an empty slice before the first success.
    pub fn items(&self) -> &[T] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or_default()
    }
}

type SharedFetch<T> = Shared<BoxFuture<'static, QueryState<T>>>;

struct Inflight<T> {
    seq: u64,
    result: SharedFetch<T>,
}

struct Entry<T> {
    data: Option<Arc<Vec<T>>>,
    error: Option<Error>,
    stale: bool,
    applied_seq: u64,
    invalidated_at: u64,
    inflight: Option<Inflight<T>>,
    refetch_scheduled: bool,
    fetcher: Option<Fetcher<T>>,
    updates: watch::Sender<QueryState<T>>,
}

impl<T: Clone + Send + Sync + 'static> Entry<T> {
    fn new() -> Self {
        let (updates, _) = watch::channel(QueryState::default());
        Self {
            data: None,
            error: None,
            stale: false,
            applied_seq: 0,
            invalidated_at: 0,
            inflight: None,
            refetch_scheduled: false,
            fetcher: None,
            updates,
        }
    }

    fn snapshot(&self) -> QueryState<T> {
        QueryState {
            data: self.data.clone(),
            is_loading: self.inflight.is_some(),
            error: self.error.clone(),
            is_stale: self.stale,
        }
    }

    fn publish(&self) -> QueryState<T> {
        let state = self.snapshot();
        self.updates.send_replace(state.clone());
        state
    }

    fn is_fresh(&self) -> bool {
        self.data.is_some() && !self.stale && self.error.is_none()
    }

    fn joinable(&self) -> Option<SharedFetch<T>> {
        self.inflight
            .as_ref()
            .filter(|inflight| inflight.seq > self.invalidated_at)
            .map(|inflight| inflight.result.clone())
    }
}

struct CacheInner<T> {
    entries: Mutex<HashMap<CacheKey, Entry<T>>>,
    next_seq: AtomicU64,
    window: Duration,
    closed: AtomicBool,
}

/// Shared, cloneable handle to a cache of `T` lists.
///
/// Fetches and scheduled refetches run as tokio tasks, so the mutating
/// methods must be called from within a tokio runtime.
pub struct QueryCache<T> {
    inner: Arc<CacheInner<T>>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for QueryCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("window", &self.inner.window)
            .field("closed", &self.inner.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_INVALIDATION_WINDOW)
    }
}

impl<T: Clone + Send + Sync + 'static> QueryCache<T> {
    /// Empty cache whose refetches wait `window` after an invalidation.
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
                window,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// State of `key` for a view, fetching through `fetcher` when the entry
    /// is empty, stale or errored. Concurrent reads share one request.
    pub async fn read(&self, key: &CacheKey, fetcher: Fetcher<T>) -> QueryState<T> {
        self.request(key, fetcher).await
    }

    /// Start or join the fetch [`QueryCache::read`] would await.
    ///
    /// The fetch is registered before this returns, so the order of
    /// `request` calls is the start order of their fetches.
    pub fn request(&self, key: &CacheKey, fetcher: Fetcher<T>) -> BoxFuture<'static, QueryState<T>> {
        let mut entries = self.inner.lock();
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.fetcher = Some(fetcher);
        if self.inner.is_closed() || entry.is_fresh() {
            let state = entry.snapshot();
            return async move { state }.boxed();
        }
        if let Some(shared) = entry.joinable() {
            debug!(%key, "joining in-flight fetch");
            return shared.boxed();
        }
        match CacheInner::start_fetch(&self.inner, key, entry) {
            Some(shared) => shared.boxed(),
            None => {
                let state = entry.snapshot();
                async move { state }.boxed()
            }
        }
    }

    /// Current state of `key` without fetching.
    pub fn snapshot(&self, key: &CacheKey) -> QueryState<T> {
        self.inner
            .lock()
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_default()
    }

    /// Receive every state change of `key`.
    pub fn subscribe(&self, key: &CacheKey) -> watch::Receiver<QueryState<T>> {
        self.inner
            .lock()
            .entry(key.clone())
            .or_insert_with(Entry::new)
            .updates
            .subscribe()
    }

    /// Mark `key` stale and schedule a refetch.
    ///
    /// Invalidations inside one window share a single refetch. Keys that were
    /// never read have nothing to refetch.
    pub fn invalidate(&self, key: &CacheKey) {
        if self.inner.is_closed() {
            return;
        }
        let mut entries = self.inner.lock();
        if let Some(entry) = entries.get_mut(key) {
            CacheInner::invalidate_entry(&self.inner, key, entry);
        }
    }

    /// Invalidate every cached list of `kind`; returns how many keys were hit.
    pub fn invalidate_kind(&self, kind: EntityKind) -> usize {
        if self.inner.is_closed() {
            return 0;
        }
        let mut entries = self.inner.lock();
        let mut hit = 0;
        for (key, entry) in entries.iter_mut().filter(|(key, _)| key.kind() == kind) {
            CacheInner::invalidate_entry(&self.inner, key, entry);
            hit += 1;
        }
        debug!(%kind, keys = hit, "invalidated entity lists");
        hit
    }

    /// End the cache lifecycle. Results arriving afterwards are discarded
    /// and no further fetches start.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let entries = self.inner.lock();
        debug!(keys = entries.len(), "query cache shut down");
    }

    /// Whether [`QueryCache::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.inner.is_closed()
    }
}

impl<T: Clone + Send + Sync + 'static> CacheInner<T> {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn start_fetch(
        this: &Arc<Self>,
        key: &CacheKey,
        entry: &mut Entry<T>,
    ) -> Option<SharedFetch<T>> {
        let fetcher = entry.fetcher.clone()?;
        let Ok(runtime) = Handle::try_current() else {
            warn!(%key, "no async runtime available; fetch skipped");
            return None;
        };
        let seq = this.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let request = fetcher();
        let task_key = key.clone();
        let task_inner = Arc::clone(this);
        let task = runtime.spawn(async move {
            let result = match tokio::spawn(request).await {
                Ok(result) => result,
                Err(join_error) => {
                    warn!(key = %task_key, error = %join_error, "fetch task failed");
                    Err(Error::internal(format!("fetch for {task_key} failed")))
                }
            };
            task_inner.complete(&task_key, seq, result)
        });
        let fallback_key = key.clone();
        let shared = task
            .map(move |joined| {
                joined.unwrap_or_else(|join_error| {
                    warn!(key = %fallback_key, error = %join_error, "fetch completion lost");
                    QueryState {
                        error: Some(Error::internal(format!(
                            "fetch for {fallback_key} failed"
                        ))),
                        ..QueryState::default()
                    }
                })
            })
            .boxed()
            .shared();
        debug!(%key, seq, "fetch started");
        entry.inflight = Some(Inflight {
            seq,
            result: shared.clone(),
        });
        entry.publish();
        Some(shared)
    }

    fn complete(&self, key: &CacheKey, seq: u64, result: Result<Vec<T>, Error>) -> QueryState<T> {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return QueryState::default();
        };
        if entry.inflight.as_ref().is_some_and(|inflight| inflight.seq == seq) {
            entry.inflight = None;
        }
        if self.is_closed() {
            debug!(%key, seq, "discarding response after shutdown");
            return entry.snapshot();
        }
        if seq <= entry.applied_seq {
            debug!(%key, seq, applied = entry.applied_seq, "ignoring out-of-order response");
            return entry.publish();
        }
        entry.applied_seq = seq;
        match result {
            Ok(items) => {
                entry.data = Some(Arc::new(items));
                entry.error = None;
            }
            Err(error) => {
                warn!(%key, code = ?error.code(), message = error.message(), "fetch failed");
                entry.error = Some(error);
            }
        }
        entry.stale = seq <= entry.invalidated_at;
        entry.publish()
    }

    fn invalidate_entry(this: &Arc<Self>, key: &CacheKey, entry: &mut Entry<T>) {
        entry.stale = true;
        entry.invalidated_at = this.next_seq.load(Ordering::SeqCst);
        entry.publish();
        if entry.refetch_scheduled || entry.fetcher.is_none() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!(%key, "no async runtime available; refetch not scheduled");
            return;
        };
        entry.refetch_scheduled = true;
        let inner = Arc::clone(this);
        let key = key.clone();
        let window = this.window;
        runtime.spawn(async move {
            tokio::time::sleep(window).await;
            inner.refetch(&key);
        });
    }

    fn refetch(self: &Arc<Self>, key: &CacheKey) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.refetch_scheduled = false;
        if self.is_closed() || !entry.stale || entry.joinable().is_some() {
            return;
        }
        debug!(%key, "refetching invalidated list");
        let _ = Self::start_fetch(self, key, entry);
    }
}

#[cfg(test)]
#[path = "query_cache_tests.rs"]
mod tests;
