//! Explicit raw result cache
//!
//! The cache is an ordinary value shared through `Arc`, so every dashboard
//! (or test) decides which engines share results and when they are dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::error::QueryError;
use super::raw::RawResult;
use super::QueryEngine;
use crate::query::Selections;
use crate::result_spec::ResultSpec;

/// (namespace, selections key)
type CacheKey = (String, String);

struct CacheInner {
    entries: HashMap<CacheKey, Arc<RawResult>>,
    /// Insertion order, oldest first
    order: VecDeque<CacheKey>,
}

/// Bounded memo of raw results keyed by (namespace, selections)
///
/// Keys use [`Selections::cache_key`], so query-equal selections share an entry.
pub struct ResultCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    fn key(namespace: &str, selections: &Selections) -> CacheKey {
        (namespace.to_string(), selections.cache_key())
    }

    pub fn get(&self, namespace: &str, selections: &Selections) -> Option<Arc<RawResult>> {
        self.inner.lock().entries.get(&Self::key(namespace, selections)).cloned()
    }

    pub fn insert(&self, namespace: &str, selections: &Selections, raw: Arc<RawResult>) {
        let key = Self::key(namespace, selections);
        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), raw).is_none() {
            inner.order.push_back(key);
        }
        while inner.entries.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&self, namespace: &str, selections: &Selections) -> bool {
        let key = Self::key(namespace, selections);
        let mut inner = self.inner.lock();
        let existed = inner.entries.remove(&key).is_some();
        if existed {
            inner.order.retain(|k| k != &key);
        }
        existed
    }

    /// Drop every entry of a namespace. Returns how many were removed.
    pub fn invalidate_namespace(&self, namespace: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|(ns, _), _| ns != namespace);
        inner.order.retain(|(ns, _)| ns != namespace);
        before - inner.entries.len()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wraps a query engine with a [`ResultCache`]
///
/// The result spec is not part of the key: display settings are applied by
/// rebuilding locally, never by the backend.
pub struct CachingQueryEngine {
    inner: Arc<dyn QueryEngine>,
    cache: Arc<ResultCache>,
    namespace: String,
}

impl CachingQueryEngine {
    pub fn new(
        inner: Arc<dyn QueryEngine>,
        cache: Arc<ResultCache>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            namespace: namespace.into(),
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }
}

impl QueryEngine for CachingQueryEngine {
    fn run(
        &self,
        selections: &Selections,
        result_spec: Option<&ResultSpec>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<RawResult, QueryError>> {
        if let Some(hit) = self.cache.get(&self.namespace, selections) {
            tracing::trace!(namespace = %self.namespace, "raw result cache hit");
            return futures::future::ready(Ok(hit.as_ref().clone())).boxed();
        }

        let fetch = self.inner.run(selections, result_spec, cancel);
        let cache = Arc::clone(&self.cache);
        let namespace = self.namespace.clone();
        let selections = selections.clone();
        async move {
            let raw = fetch.await?;
            cache.insert(&namespace, &selections, Arc::new(raw.clone()));
            Ok(raw)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl QueryEngine for CountingEngine {
        fn run(
            &self,
            _selections: &Selections,
            _result_spec: Option<&ResultSpec>,
            _cancel: CancellationToken,
        ) -> BoxFuture<'static, Result<RawResult, QueryError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(Ok(RawResult::default())).boxed()
        }
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResultCache::new(2);
        let a = Selections::new(["a"]);
        let b = Selections::new(["b"]);
        let c = Selections::new(["c"]);
        cache.insert("table", &a, Arc::new(RawResult::default()));
        cache.insert("table", &b, Arc::new(RawResult::default()));
        cache.insert("table", &c, Arc::new(RawResult::default()));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("table", &a).is_none());
        assert!(cache.get("table", &c).is_some());
    }

    #[test]
    fn test_invalidation() {
        let cache = ResultCache::new(8);
        let a = Selections::new(["a"]);
        cache.insert("table", &a, Arc::new(RawResult::default()));
        cache.insert("bar_graph", &a, Arc::new(RawResult::default()));
        assert!(cache.invalidate("table", &a));
        assert!(!cache.invalidate("table", &a));
        assert_eq!(cache.invalidate_namespace("bar_graph"), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_distinct_queries_never_share_an_entry() {
        let cache = ResultCache::new(8);
        let joined = Selections::new(["a,b"]);
        let split = Selections::new(["a", "b"]);
        cache.insert("table", &joined, Arc::new(RawResult::default()));
        assert!(cache.get("table", &split).is_none());
        assert!(cache.get("table#x", &joined).is_none());

        cache.insert("table#x", &joined, Arc::new(RawResult::default()));
        assert_eq!(cache.invalidate_namespace("table"), 1);
        assert!(cache.get("table#x", &joined).is_some());
    }

    #[tokio::test]
    async fn test_caching_engine_hits_after_first_fetch() {
        let inner = Arc::new(CountingEngine { calls: AtomicUsize::new(0) });
        let cache = Arc::new(ResultCache::new(4));
        let engine = CachingQueryEngine::new(inner.clone(), cache.clone(), "table");
        let selections = Selections::new(["revenue"]);

        engine.run(&selections, None, CancellationToken::new()).await.unwrap();
        engine.run(&selections, None, CancellationToken::new()).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cache.clear();
        engine.run(&selections, None, CancellationToken::new()).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
