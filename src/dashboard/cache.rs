//! Process-local memoization of loaded datasets and derived views.
//!
//! Entries are keyed by the producing function's name plus a hash of its
//! arguments and live until they are invalidated explicitly. Re-running a
//! cleaning stage does not refresh anything on its own: call
//! [`FrameCache::invalidate_function`] or [`FrameCache::clear`] afterwards.

use log::debug;
use std::any::Any;
use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identifies one memoized call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    function: &'static str,
    args: u64,
}

impl CacheKey {
    pub fn new<A: Hash + ?Sized>(function: &'static str, args: &A) -> Self {
        let mut hasher = DefaultHasher::new();
        args.hash(&mut hasher);
        Self {
            function,
            args: hasher.finish(),
        }
    }

    pub fn function(&self) -> &'static str {
        self.function
    }
}

type CachedValue = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct FrameCache {
    entries: Mutex<HashMap<CacheKey, CachedValue>>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or runs `load` and caches its
    /// result. Failed loads are not cached.
    ///
    /// `load` runs without holding the lock; when two callers race, the value
    /// inserted first wins and both receive it.
    pub async fn get_or_try_insert_with<T, E, F, Fut>(
        &self,
        key: CacheKey,
        load: F,
    ) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        {
            let entries = self.entries.lock().await;
            if let Some(hit) = entries.get(&key).and_then(|v| downcast::<T>(v)) {
                debug!("Cache hit for {}", key.function);
                return Ok(hit);
            }
        }

        let loaded: Arc<T> = Arc::new(load().await?);

        let mut entries = self.entries.lock().await;
        match entries.entry(key) {
            Entry::Occupied(mut entry) => match downcast::<T>(entry.get()) {
                Some(existing) => Ok(existing),
                None => {
                    entry.insert(loaded.clone());
                    Ok(loaded)
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(loaded.clone());
                Ok(loaded)
            }
        }
    }

    /// Drops one entry. Returns whether it was present.
    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.lock().await.remove(key).is_some()
    }

    /// Drops every entry produced by `function`. Returns how many were removed.
    pub async fn invalidate_function(&self, function: &str) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| key.function != function);
        before - entries.len()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

fn downcast<T: Any + Send + Sync>(value: &CachedValue) -> Option<Arc<T>> {
    value.clone().downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(calls: &AtomicUsize, value: i64) -> Result<i64, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cache = FrameCache::new();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::new("load", &("a.csv", 1950));

        let first = cache
            .get_or_try_insert_with(key, || counted(&calls, 7))
            .await
            .unwrap();
        let second = cache
            .get_or_try_insert_with(key, || counted(&calls, 8))
            .await
            .unwrap();

        assert_eq!((*first, *second), (7, 7));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_arguments_are_different_entries() {
        let cache = FrameCache::new();
        let a = CacheKey::new("load", "a.csv");
        let b = CacheKey::new("load", "b.csv");
        assert_ne!(a, b);

        cache
            .get_or_try_insert_with(a, || async { Ok::<_, String>(1) })
            .await
            .unwrap();
        cache
            .get_or_try_insert_with(b, || async { Ok::<_, String>(2) })
            .await
            .unwrap();
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = FrameCache::new();
        let key = CacheKey::new("load", "a.csv");
        let failed = cache
            .get_or_try_insert_with(key, || async { Err::<i64, _>("boom".to_string()) })
            .await;
        assert!(failed.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidation() {
        let cache = FrameCache::new();
        let calls = AtomicUsize::new(0);
        let par = CacheKey::new("load_par", "par.csv");
        let land = CacheKey::new("load_landfall", "land.csv");
        let view = CacheKey::new("overview", &(1950, 2023));

        for key in [par, land, view] {
            cache
                .get_or_try_insert_with(key, || counted(&calls, 1))
                .await
                .unwrap();
        }
        assert!(cache.invalidate(&par).await);
        assert!(!cache.invalidate(&par).await);
        assert_eq!(cache.invalidate_function("load_landfall").await, 1);
        assert_eq!(cache.len().await, 1);

        cache
            .get_or_try_insert_with(par, || counted(&calls, 2))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
