//! # Query Cache
//!
//! Response cache with request de-duplication, shared by the resource
//! modules.
//!
//! ## Fetch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       QueryCache::fetch(key)                            │
//! │                                                                         │
//! │   fresh entry? ──yes──► return cached value                             │
//! │        │ no                                                             │
//! │        ▼                                                                │
//! │   lock key ◄──── concurrent callers with the same key wait here         │
//! │        │                                                                │
//! │   fresh now? ──yes──► return (filled by the caller ahead of us)         │
//! │        │ no                                                             │
//! │        ▼                                                                │
//! │   run fetcher ──ok──► store, return                                     │
//! │        │                                                                │
//! │        └──err──► return error, keep the previous entry                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are path-like (`products`, `products/42`, `transactions/all`).
//! Mutations call [`QueryCache::invalidate`] with a prefix.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

use crate::error::ClientResult;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct QueryCache {
    stale_time: Duration,
    entries: RwLock<HashMap<String, Entry>>,
    /// One lock per key; holding it means "a fetch for this key is running".
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Returns the cached value for `key` when fresh, otherwise runs
    /// `fetcher` once for all concurrent callers of the same key.
    pub async fn fetch<T, F, Fut>(&self, key: &str, fetcher: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if let Some(value) = self.fresh(key).await {
            debug!(key, "Cache hit");
            return decode(value);
        }

        self.exclusive(key, async {
            match self.fresh(key).await {
                Some(value) => {
                    debug!(key, "Cache filled while waiting");
                    decode(value)
                }
                None => self.run_and_store(key, fetcher).await,
            }
        })
        .await
    }

    /// Fetches `key` regardless of freshness (the "refresh" button).
    ///
    /// Still de-duplicated against a fetch of the same key in progress.
    pub async fn refetch<T, F, Fut>(&self, key: &str, fetcher: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        self.exclusive(key, self.run_and_store(key, fetcher)).await
    }

    /// Runs `work` holding the lock for `key`, then drops the lock entry if
    /// no other caller is waiting on it.
    async fn exclusive<R>(&self, key: &str, work: impl Future<Output = R>) -> R {
        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            work.await
        };

        let mut in_flight = self.in_flight.lock().await;
        // the map's copy and ours; new waiters clone under `in_flight`
        if Arc::strong_count(&lock) == 2 {
            in_flight.remove(key);
        }
        result
    }

    async fn run_and_store<T, F, Fut>(&self, key: &str, fetcher: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        debug!(key, "Cache miss, fetching");
        let value = fetcher().await?;
        self.set(key, &value).await?;
        Ok(value)
    }

    /// Stores `value` under `key` as freshly fetched.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> ClientResult<()> {
        let entry = Entry {
            value: serde_json::to_value(value)?,
            fetched_at: Instant::now(),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    /// Cached value for `key`, fresh or not.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub async fn is_fresh(&self, key: &str) -> bool {
        self.fresh(key).await.is_some()
    }

    /// Drops `prefix` and every key below it (`prefix/...`, `prefix?...`).
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key_matches(key, prefix));
        let removed = before - entries.len();
        debug!(prefix, removed, "Cache invalidated");
        removed
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn fresh(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_time)
            .map(|entry| entry.value.clone())
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    Ok(serde_json::from_value(value)?)
}

fn key_matches(key: &str, prefix: &str) -> bool {
    match key.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_served_from_cache() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value: u32 = cache
                .fetch("products", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_refetched() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = || async move { Ok::<_, ClientError>(calls.fetch_add(1, Ordering::SeqCst) as u32) };

        assert_eq!(cache.fetch("products", fetch).await.unwrap(), 0);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!cache.is_fresh("products").await);
        assert_eq!(cache.fetch("products", fetch).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_deduplicated() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ClientError>(vec!["npk".to_string()])
        };

        let (a, b, c) = tokio::join!(
            cache.fetch("product-types", fetch),
            cache.fetch("product-types", fetch),
            cache.fetch("product-types", fetch),
        );

        assert_eq!(a.unwrap(), vec!["npk"]);
        assert_eq!(b.unwrap(), vec!["npk"]);
        assert_eq!(c.unwrap(), vec!["npk"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_key_locks_do_not_accumulate() {
        let cache = QueryCache::new(Duration::from_secs(60));
        for id in 0..50 {
            let key = format!("products/{}", id);
            cache.fetch(&key, || async move { Ok::<_, ClientError>(id) }).await.unwrap();
            cache.refetch(&key, || async move { Ok::<_, ClientError>(id) }).await.unwrap();
        }
        let failed = cache
            .fetch("reports/summary", || async { Err::<u32, _>(ClientError::NotAuthenticated) })
            .await;
        assert!(failed.is_err());

        assert!(cache.in_flight.lock().await.is_empty());
        assert_eq!(cache.get::<i32>("products/49").await, Some(49));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_last_success() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.set("transactions", &vec![1u32, 2]).await.unwrap();

        let err = cache
            .refetch::<Vec<u32>, _, _>("transactions", || async {
                Err(ClientError::Network("connection reset".into()))
            })
            .await;
        assert!(err.is_err());

        let cached: Option<Vec<u32>> = cache.get("transactions").await;
        assert_eq!(cached, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_refetch_bypasses_freshness() {
        let cache = QueryCache::new(Duration::from_secs(60));
        cache.set("reports/summary", &1u32).await.unwrap();

        let value: u32 = cache.refetch("reports/summary", || async { Ok(2) }).await.unwrap();
        assert_eq!(value, 2);
        assert_eq!(cache.get::<u32>("reports/summary").await, Some(2));
    }

    #[tokio::test]
    async fn test_invalidate_by_prefix() {
        let cache = QueryCache::new(Duration::from_secs(60));
        for key in ["transactions", "transactions/t1", "transactions?status=paid", "transactions-export", "products"] {
            cache.set(key, &0u8).await.unwrap();
        }

        assert_eq!(cache.invalidate("transactions").await, 3);
        assert!(cache.is_fresh("transactions-export").await);
        assert!(cache.is_fresh("products").await);
        assert!(!cache.is_fresh("transactions/t1").await);
    }

    #[test]
    fn test_key_matches() {
        assert!(key_matches("products", "products"));
        assert!(key_matches("products/42", "products"));
        assert!(key_matches("products?page=2", "products"));
        assert!(!key_matches("product-types", "products"));
        assert!(!key_matches("cart-items", "products"));
    }
}
