//! Single-slot, time-bounded result cache.
//!
//! Readers call [`ResultCache::get_fresh`], which loads an `Arc` snapshot of the
//! slot with no lock contention. A miss or an expired entry is refilled by
//! [`ResultCache::get_or_populate`], which runs the supplied future and
//! atomically swaps the new entry in. [`ResultCache::invalidate`] empties the
//! slot so the next read repopulates it.
//!
//! Implementation notes:
//! - Uses `arc-swap` for atomic pointer swaps + cheap reads (no RwLock).
//! - Only successful results are stored; a failed populate leaves the slot
//!   as it was.
//! - Two callers that miss at the same time may both populate; the last store
//!   wins and readers see one complete entry or the other.

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwapOption;
use tracing::{debug, info};

/// A cached value and the moment it was stored.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub value: Arc<T>,
    pub filled_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh_at(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.filled_at) < ttl
    }
}

pub struct ResultCache<T> {
    slot: ArcSwapOption<CacheEntry<T>>,
    ttl: Duration,
}

impl<T> ResultCache<T> {
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            ttl,
        }
    }

    /// Returns the cached value if it is younger than the TTL.
    pub fn get_fresh(&self) -> Option<Arc<T>> {
        self.get_fresh_at(Instant::now())
    }

    fn get_fresh_at(&self, now: Instant) -> Option<Arc<T>> {
        let guard = self.slot.load();
        guard
            .as_ref()
            .filter(|entry| entry.is_fresh_at(self.ttl, now))
            .map(|entry| Arc::clone(&entry.value))
    }

    /// Age of the stored entry, fresh or not.
    pub fn age(&self) -> Option<Duration> {
        self.slot
            .load()
            .as_ref()
            .map(|entry| entry.filled_at.elapsed())
    }

    /// Stores `value`, replacing whatever the slot held.
    pub fn store(&self, value: T) -> Arc<T> {
        self.store_at(value, Instant::now())
    }

    fn store_at(&self, value: T, filled_at: Instant) -> Arc<T> {
        let value = Arc::new(value);
        self.slot.store(Some(Arc::new(CacheEntry {
            value: Arc::clone(&value),
            filled_at,
        })));
        value
    }

    /// Empties the slot. The next [`get_or_populate`](Self::get_or_populate) refills it.
    pub fn invalidate(&self) {
        self.slot.store(None);
        info!("result cache invalidated");
    }

    /// Returns the fresh cached value, or runs `populate` and caches its success.
    pub async fn get_or_populate<E, F, Fut>(&self, populate: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get_fresh() {
            debug!("result cache hit");
            return Ok(hit);
        }

        let value = populate().await?;
        info!(ttl_secs = self.ttl.as_secs(), "result cache filled");
        Ok(self.store(value))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn entries_expire_after_ttl() {
        let cache = ResultCache::new(Duration::from_secs(600));
        let t0 = Instant::now();
        cache.store_at(7, t0);

        assert_eq!(cache.get_fresh_at(t0).as_deref(), Some(&7));
        assert_eq!(
            cache.get_fresh_at(t0 + Duration::from_secs(599)).as_deref(),
            Some(&7)
        );
        assert!(cache.get_fresh_at(t0 + Duration::from_secs(600)).is_none());
    }

    #[test]
    fn invalidate_empties_the_slot() {
        let cache = ResultCache::new(Duration::from_secs(300));
        cache.store("ratio table");
        assert!(cache.get_fresh().is_some());
        assert!(cache.age().is_some());

        cache.invalidate();
        assert!(cache.get_fresh().is_none());
        assert!(cache.age().is_none());
    }

    #[tokio::test]
    async fn populates_once_while_fresh() {
        let cache = ResultCache::new(Duration::from_secs(300));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_populate(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(42)
                })
                .await
                .unwrap();
            assert_eq!(*v, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache: ResultCache<u32> = ResultCache::new(Duration::from_secs(300));

        let err = cache
            .get_or_populate(|| async { Err::<u32, _>("upstream down") })
            .await
            .unwrap_err();
        assert_eq!(err, "upstream down");
        assert!(cache.get_fresh().is_none());

        let v = cache
            .get_or_populate(|| async { Ok::<_, &str>(1) })
            .await
            .unwrap();
        assert_eq!(*v, 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_entry() {
        // Zero TTL: every stored entry is already stale.
        let cache = ResultCache::new(Duration::ZERO);
        cache.store(5);
        assert!(cache.get_fresh().is_none());

        let err = cache
            .get_or_populate(|| async { Err::<u32, _>("timeout") })
            .await;
        assert!(err.is_err());
        // Still expired, but not torn down by the failed refresh.
        assert!(cache.age().is_some());
    }
}
