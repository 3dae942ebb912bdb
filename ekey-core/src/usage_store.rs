//! Atomic per-trace replay counter with TTL.
//!
//! `consume` is the only non-trivial synchronization point in the core: two
//! concurrent calls for the same `trace` with `limit = 1` must yield exactly
//! one `Ok` and one [`UsageStoreError::LimitExhausted`]. The in-process
//! implementation below achieves this with a single [`std::sync::Mutex`]
//! guarding the whole table — simple and correct at the scale (tens of
//! thousands of live traces) this crate targets; see `DESIGN.md` for the
//! sharded-lock alternative that was considered and not built.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use lru::LruCache;

use crate::error::UsageStoreError;

/// Value held per `trace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UsageRecord {
    used: u32,
    limit: u32,
    exp: u64,
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    /// See the module docs and spec §4.3 for the exact state-transition
    /// table this must implement.
    async fn consume(
        &self,
        trace: &str,
        limit: u32,
        exp: u64,
        now: u64,
    ) -> Result<(), UsageStoreError>;
}

struct Inner {
    records: LruCache<String, UsageRecord>,
}

/// The in-process `UsageStore`, bounded by `capacity` and backed by an
/// `lru`-ordered map so that a flood of distinct traces evicts the least
/// recently touched entries rather than growing without bound. A trimmed
/// trace that is later presented again is treated as a brand new record,
/// which is safe: the token's own `exp` still gates stale reuse, since
/// forging a *fresh* token requires the issuer's private key.
pub struct InMemoryUsageStore {
    inner: Mutex<Inner>,
}

impl InMemoryUsageStore {
    pub fn new(capacity: std::num::NonZeroUsize) -> Arc<Self> {
        Arc::new(InMemoryUsageStore {
            inner: Mutex::new(Inner { records: LruCache::new(capacity) }),
        })
    }

    /// Evict every record with `now > record.exp`. Called periodically by a
    /// background task; also safe to call inline from tests.
    pub fn evict_expired(&self, now: u64) {
        let mut inner = self.inner.lock().expect("usage store mutex poisoned");
        let expired: Vec<String> = inner
            .records
            .iter()
            .filter(|(_, rec)| now > rec.exp)
            .map(|(trace, _)| trace.clone())
            .collect();
        for trace in expired {
            inner.records.pop(&trace);
        }
    }

    /// Spawn a background task that calls [`Self::evict_expired`] on
    /// `interval`, using `clock` to get `now`. Returns a handle whose
    /// `Drop` does not stop the task; callers that want to stop it should
    /// hold the returned `EkeyTask` and drop it only when they're also
    /// ready to stop receiving usage tracking (typically: never, for the
    /// life of the process).
    pub fn spawn_eviction_loop(
        self: &Arc<Self>,
        clock: Arc<dyn crate::clock::Clock>,
        interval: Duration,
    ) -> ekey_tokio::EkeyTask<()> {
        let store = Arc::clone(self);
        ekey_tokio::EkeyTask::spawn("usage-store-eviction", async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                store.evict_expired(clock.now());
            }
        })
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn consume(
        &self,
        trace: &str,
        limit: u32,
        exp: u64,
        now: u64,
    ) -> Result<(), UsageStoreError> {
        let mut inner = self.inner.lock().expect("usage store mutex poisoned");

        match inner.records.get_mut(trace) {
            None => {
                if now > exp {
                    return Err(UsageStoreError::TokenExpired);
                }
                inner.records.put(trace.to_string(), UsageRecord { used: 1, limit, exp });
                Ok(())
            }
            Some(record) => {
                if now > record.exp {
                    inner.records.pop(trace);
                    return Err(UsageStoreError::TokenExpired);
                }
                if record.used >= record.limit {
                    return Err(UsageStoreError::LimitExhausted);
                }
                record.used += 1;
                Ok(())
            }
        }
    }
}

/// The spec's default `usage_store_capacity`.
pub fn default_capacity() -> std::num::NonZeroUsize {
    std::num::NonZeroUsize::new(10_000).expect("10_000 != 0")
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;

    fn small_store() -> Arc<InMemoryUsageStore> {
        InMemoryUsageStore::new(std::num::NonZeroUsize::new(16).unwrap())
    }

    #[tokio::test]
    async fn first_consume_creates_record() {
        let store = small_store();
        store.consume("t1", 1, 100, 10).await.unwrap();
    }

    #[tokio::test]
    async fn limit_one_rejects_second_consume() {
        let store = small_store();
        store.consume("t1", 1, 100, 10).await.unwrap();
        let err = store.consume("t1", 1, 100, 10).await.unwrap_err();
        assert_eq!(err, UsageStoreError::LimitExhausted);
    }

    #[tokio::test]
    async fn limit_n_allows_exactly_n_consumes() {
        let store = small_store();
        for _ in 0..5 {
            store.consume("t1", 5, 100, 10).await.unwrap();
        }
        assert_eq!(
            store.consume("t1", 5, 100, 10).await.unwrap_err(),
            UsageStoreError::LimitExhausted
        );
    }

    #[tokio::test]
    async fn expired_before_first_consume_is_not_created() {
        let store = small_store();
        let err = store.consume("t1", 1, 50, 100).await.unwrap_err();
        assert_eq!(err, UsageStoreError::TokenExpired);
        // Presenting the same trace again after the clock rewinds (it
        // shouldn't, but if a caller mis-wires clocks) must still be
        // treated as a fresh record, since none was created above.
        store.consume("t1", 1, 500, 100).await.unwrap();
    }

    #[tokio::test]
    async fn existing_record_expires_on_ttl() {
        let store = small_store();
        store.consume("t1", 3, 100, 10).await.unwrap();
        let err = store.consume("t1", 3, 100, 200).await.unwrap_err();
        assert_eq!(err, UsageStoreError::TokenExpired);
    }

    #[tokio::test]
    async fn concurrent_consumes_yield_exactly_one_ok() {
        let store = small_store();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.consume("shared-trace", 1, 1_000, 10).await
            }));
        }
        let mut ok_count = 0;
        let mut exhausted_count = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(()) => ok_count += 1,
                Err(UsageStoreError::LimitExhausted) => exhausted_count += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(ok_count, 1);
        assert_eq!(exhausted_count, 7);
    }

    #[tokio::test]
    async fn eviction_loop_reclaims_expired_traces() {
        let store = small_store();
        store.consume("t1", 1, 5, 0).await.unwrap();
        store.evict_expired(100);
        // Trace was evicted, so this is treated as a new record and
        // succeeds instead of hitting LimitExhausted.
        store.consume("t1", 1, 5, 0).await.unwrap();
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

        /// For any `limit`, firing `limit + 3` concurrent consumes of the
        /// same trace must yield exactly `limit` oks.
        #[test]
        fn concurrent_consumes_never_exceed_limit(limit in 1u32..8) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let ok_count = rt.block_on(async {
                let store = InMemoryUsageStore::new(std::num::NonZeroUsize::new(16).unwrap());
                let mut handles = Vec::new();
                for _ in 0..(limit + 3) {
                    let store = Arc::clone(&store);
                    handles.push(tokio::spawn(async move {
                        store.consume("shared-trace", limit, 1_000, 10).await
                    }));
                }
                let mut ok_count = 0u32;
                for h in handles {
                    if h.await.unwrap().is_ok() {
                        ok_count += 1;
                    }
                }
                ok_count
            });
            proptest::prop_assert_eq!(ok_count, limit);
        }
    }
}
