//! Memoizing caches keyed by qualified [`Identifier`]s.
//!
//! Schema introspection is expensive and frequently re-requests the same
//! object (a table referenced by several foreign keys, a view selecting from
//! a table already loaded). [`AsyncCache`] guarantees the loader runs **at
//! most once** per key even under concurrent callers: every caller observes
//! the same eventual value, or the same replayed failure.
//!
//! Caches are scoped to the lifetime of one schema snapshot; there is no
//! eviction or invalidation. A failed (or cancelled) load stays memoized
//! until the cache is recreated for a fresh snapshot session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::core::identifier::Identifier;
use crate::error::{Result, SchemaError};

/// Loader function supplied once at cache construction.
pub type CacheLoader<V> =
    Arc<dyn Fn(Identifier) -> BoxFuture<'static, Result<V>> + Send + Sync>;

type SharedLoad<V> = Shared<BoxFuture<'static, std::result::Result<Arc<V>, Arc<SchemaError>>>>;

/// Async memoizing cache: at most one in-flight load per key.
///
/// Concurrent `get` calls for the same key share a single load; calls for
/// different keys proceed independently. Both successes and failures are
/// memoized — a failure is replayed (via [`SchemaError::replay`]) to every
/// current and future waiter rather than silently retried. Cancellation
/// inside a load surfaces `Cancelled` to all waiters of that key.
pub struct AsyncCache<V: Send + Sync + 'static> {
    loader: CacheLoader<V>,
    entries: Mutex<HashMap<Identifier, SharedLoad<V>>>,
}

impl<V: Send + Sync + 'static> AsyncCache<V> {
    /// Create a cache around the given loader.
    pub fn new(loader: CacheLoader<V>) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Get the value for `key`, loading it if this is the first request.
    ///
    /// The key should already be qualified and resolved so that equivalent
    /// spellings hit the same entry.
    pub async fn get(&self, key: &Identifier) -> Result<Arc<V>> {
        let shared = {
            let mut entries = self.entries.lock().expect("cache mutex poisoned");
            match entries.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let load = (self.loader)(key.clone());
                    let shared = async move { load.await.map(Arc::new).map_err(Arc::new) }
                        .boxed()
                        .shared();
                    entries.insert(key.clone(), shared.clone());
                    shared
                }
            }
        };

        match shared.await {
            Ok(value) => Ok(value),
            Err(err) => Err(SchemaError::replay(&err)),
        }
    }

    /// True if a load for `key` has been started (it may still be in flight).
    pub fn contains(&self, key: &Identifier) -> bool {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .contains_key(key)
    }

    /// Number of keys with a started load.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    /// True if no load has been started.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Send + Sync + 'static> std::fmt::Debug for AsyncCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn key(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    fn counting_loader(counter: Arc<AtomicUsize>) -> CacheLoader<String> {
        Arc::new(move |id: Identifier| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                // Hold the load open long enough for waiters to pile up.
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(format!("loaded:{}", id.local_name))
            }
            .boxed()
        })
    }

    // =========================================================================
    // At-most-once tests
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_gets_invoke_loader_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cache = Arc::new(AsyncCache::new(counting_loader(Arc::clone(&counter))));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(
                async move { cache.get(&key("users")).await },
            ));
        }

        for handle in handles {
            let value = handle.await.unwrap().unwrap();
            assert_eq!(*value, "loaded:users");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_load_independently() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cache = AsyncCache::new(counting_loader(Arc::clone(&counter)));

        let users = key("users");
        let orders = key("orders");
        let (a, b) = tokio::join!(cache.get(&users), cache.get(&orders));
        assert_eq!(*a.unwrap(), "loaded:users");
        assert_eq!(*b.unwrap(), "loaded:orders");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_repeat_get_returns_memoized_value() {
        let counter = Arc::new(AtomicUsize::new(0));
        let cache = AsyncCache::new(counting_loader(Arc::clone(&counter)));

        let first = cache.get(&key("users")).await.unwrap();
        let second = cache.get(&key("users")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    // =========================================================================
    // Failure and cancellation tests
    // =========================================================================

    #[tokio::test]
    async fn test_failure_is_memoized_and_replayed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_in_loader = Arc::clone(&counter);
        let cache: AsyncCache<String> = AsyncCache::new(Arc::new(move |_id| {
            counter_in_loader.fetch_add(1, Ordering::SeqCst);
            async move { Err(SchemaError::load("connection reset")) }.boxed()
        }));

        let first = cache.get(&key("users")).await;
        let second = cache.get(&key("users")).await;
        assert!(matches!(first, Err(SchemaError::Load(_))));
        assert!(matches!(second, Err(SchemaError::Load(_))));
        // Not retried: one loader invocation, failure replayed.
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_propagates_to_all_waiters() {
        let token = CancellationToken::new();
        let loader_token = token.clone();
        let cache: Arc<AsyncCache<String>> = Arc::new(AsyncCache::new(Arc::new(move |_id| {
            let token = loader_token.clone();
            async move {
                token.cancelled().await;
                Err(SchemaError::Cancelled)
            }
            .boxed()
        })));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(
                async move { cache.get(&key("users")).await },
            ));
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        for handle in handles {
            let result = handle.await.unwrap();
            assert!(matches!(result, Err(SchemaError::Cancelled)));
        }
    }

}
