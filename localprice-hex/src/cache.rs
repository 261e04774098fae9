//! Shared query cache with freshness windows and single-flight fetching.
//!
//! One `QueryCache` is shared by every pipeline instance of a service. Entries are
//! addressed by structural key equality; at most one fetch per key is in flight at
//! any time, and every completed fetch bumps a shared revision counter so that
//! observers know to re-evaluate.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::watch;

use localprice_types::ProviderError;

/// Freshness, retention and retry settings for one kind of query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Data younger than this is served without refetching.
    pub stale_after: Duration,
    /// How long a settled entry survives past staleness. `None` keeps it until cleared.
    pub retain_for: Option<Duration>,
    /// Automatic retries after a retryable failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl CachePolicy {
    /// Caller location changes rarely and the lookup quota is small: fresh for a day,
    /// kept until cleared, never retried.
    pub const fn geolocation() -> Self {
        Self {
            stale_after: Duration::from_secs(24 * 60 * 60),
            retain_for: None,
            retries: 0,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Rates: fresh for an hour, evicted two hours after going stale, retried once.
    pub const fn exchange_rates() -> Self {
        Self {
            stale_after: Duration::from_secs(60 * 60),
            retain_for: Some(Duration::from_secs(2 * 60 * 60)),
            retries: 1,
            retry_delay: Duration::from_secs(1),
        }
    }

    fn is_fresh(&self, fetched_at: Instant) -> bool {
        fetched_at.elapsed() < self.stale_after
    }

    fn is_expired(&self, settled_at: Instant) -> bool {
        match self.retain_for {
            Some(retain) => settled_at.elapsed() >= self.stale_after + retain,
            None => false,
        }
    }
}

/// What an observer sees for one key.
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    pub data: Option<V>,
    pub error: Option<ProviderError>,
    pub is_fetching: bool,
}

impl<V> QueryState<V> {
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            is_fetching: false,
        }
    }

    /// Loading means there is nothing to show yet and a fetch is on its way.
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self::idle()
    }
}

struct Entry<V> {
    data: Option<(V, Instant)>,
    error: Option<ProviderError>,
    settled_at: Option<Instant>,
    in_flight: Option<u64>,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            settled_at: None,
            in_flight: None,
        }
    }
}

impl<V: Clone> Entry<V> {
    fn state(&self) -> QueryState<V> {
        QueryState {
            data: self.data.as_ref().map(|(value, _)| value.clone()),
            error: self.error.clone(),
            is_fetching: self.in_flight.is_some(),
        }
    }

    fn is_expired(&self, policy: &CachePolicy) -> bool {
        self.in_flight.is_none() && self.settled_at.is_some_and(|at| policy.is_expired(at))
    }
}

struct Inner<K, V> {
    entries: DashMap<K, Entry<V>>,
    policy: CachePolicy,
    revision: Arc<watch::Sender<u64>>,
    tickets: AtomicU64,
}

/// Keyed cache shared by all pipeline instances. Cloning is cheap.
pub struct QueryCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache that reports completions on `revision`.
    pub fn new(policy: CachePolicy, revision: Arc<watch::Sender<u64>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                policy,
                revision,
                tickets: AtomicU64::new(0),
            }),
        }
    }

    /// Creates a cache with its own revision channel.
    pub fn standalone(policy: CachePolicy) -> Self {
        Self::new(policy, Arc::new(watch::channel(0).0))
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.inner.policy
    }

    /// Subscribes to completion events.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Returns the current state for `key`, starting a background fetch when needed.
    ///
    /// A fetch starts when nothing is in flight for the key and either there is no
    /// data, the data is stale, or the entry holds an error and `mount` is set
    /// (the caller observes this key for the first time). Must be called from within
    /// a Tokio runtime.
    pub fn query<F, Fut>(&self, key: &K, mount: bool, fetch: F) -> QueryState<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ProviderError>> + Send + 'static,
    {
        let policy = self.inner.policy;
        let (state, ticket) = {
            let mut entry = self.inner.entries.entry(key.clone()).or_default();
            if entry.is_expired(&policy) {
                *entry = Entry::default();
            }

            let start = entry.in_flight.is_none()
                && match (&entry.error, &entry.data) {
                    (Some(_), _) => mount,
                    (None, Some((_, fetched_at))) => !policy.is_fresh(*fetched_at),
                    (None, None) => true,
                };

            let ticket = start.then(|| self.inner.tickets.fetch_add(1, Ordering::Relaxed));
            if ticket.is_some() {
                entry.in_flight = ticket;
            }
            (entry.state(), ticket)
        };

        if let Some(ticket) = ticket {
            self.spawn_fetch(key.clone(), ticket, fetch);
        }
        state
    }

    /// Returns the current state for `key` without fetching.
    pub fn peek(&self, key: &K) -> QueryState<V> {
        match self.inner.entries.get(key) {
            Some(entry) if !entry.is_expired(&self.inner.policy) => entry.state(),
            _ => QueryState::idle(),
        }
    }

    /// Drops the entry for `key`. A fetch still in flight for it is discarded.
    pub fn invalidate(&self, key: &K) {
        self.inner.entries.remove(key);
    }

    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Evicts every settled entry past its retention window.
    pub fn purge_expired(&self) -> usize {
        let policy = self.inner.policy;
        let before = self.inner.entries.len();
        self.inner.entries.retain(|_, entry| !entry.is_expired(&policy));
        before - self.inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn spawn_fetch<F, Fut>(&self, key: K, ticket: u64, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ProviderError>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            let result = cache.fetch_with_retry(&key, &fetch).await;
            cache.complete(&key, ticket, result);
        });
    }

    async fn fetch_with_retry<F, Fut>(&self, key: &K, fetch: &F) -> Result<V, ProviderError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, ProviderError>>,
    {
        let policy = self.inner.policy;
        let mut attempt = 0;
        loop {
            tracing::debug!(?key, attempt, "fetching");
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < policy.retries && err.is_retryable() => {
                    attempt += 1;
                    tracing::warn!(?key, error = %err, "fetch failed, retrying");
                    tokio::time::sleep(policy.retry_delay).await;
                }
                Err(err) => {
                    tracing::warn!(?key, error = %err, "fetch failed");
                    return Err(err);
                }
            }
        }
    }

    fn complete(&self, key: &K, ticket: u64, result: Result<V, ProviderError>) {
        match self.inner.entries.get_mut(key) {
            Some(mut entry) if entry.in_flight == Some(ticket) => {
                let now = Instant::now();
                entry.in_flight = None;
                entry.settled_at = Some(now);
                match result {
                    Ok(value) => {
                        entry.data = Some((value, now));
                        entry.error = None;
                    }
                    Err(err) => entry.error = Some(err),
                }
            }
            _ => tracing::debug!(?key, "discarding result of superseded fetch"),
        }
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}
