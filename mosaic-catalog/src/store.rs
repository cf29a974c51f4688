//! The three-slot cache store.
//!
//! [`CacheState`] holds the named slots: *current* (freshest complete
//! snapshot), *stale* (the one generation before it), and *last_update*
//! (when the last successful merge published). The whole triple is
//! published through one `ArcSwap`, so a reader always observes a
//! consistent state: never a torn swap, never a current without its
//! matching timestamp.
//!
//! Readers are wait-free: one `load_full`, then reads against immutable
//! data. Writers (merge publications) are serialized upstream by the
//! executor's run-lock; `rcu` here covers the read-modify-write of moving
//! the outgoing current into the stale slot.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use mosaic_core::Snapshot;
use std::sync::Arc;
use std::time::Duration;

/// The cache slots, published as one immutable value.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    /// Freshest complete snapshot, if any merge has succeeded yet.
    pub current: Option<Arc<Snapshot>>,
    /// The snapshot that was current before the most recent successful
    /// merge. Exactly one generation back, not a history.
    pub stale: Option<Arc<Snapshot>>,
    /// When the last successful merge published.
    pub last_update: Option<DateTime<Utc>>,
}

impl CacheState {
    /// The empty state a process starts with.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Age of the current snapshot, zero if the clock ran backwards.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_update
            .map(|ts| now.signed_duration_since(ts).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whether `current` is present and within the validity period.
    pub fn is_fresh(&self, now: DateTime<Utc>, validity: Duration) -> bool {
        if self.current.is_none() {
            return false;
        }
        match self.age(now) {
            Some(age) => age < validity,
            None => false,
        }
    }

    /// Whether the stale slot may still be served.
    ///
    /// The stale snapshot stopped being current at `last_update`, so its
    /// age is measured from there.
    pub fn is_stale_servable(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        if self.stale.is_none() {
            return false;
        }
        match self.age(now) {
            Some(age) => age <= retention,
            None => false,
        }
    }
}

/// Atomic holder of the current [`CacheState`].
#[derive(Debug, Default)]
pub struct CacheStore {
    state: ArcSwap<CacheState>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(CacheState::empty()),
        }
    }

    /// Load the current state. Wait-free.
    pub fn load(&self) -> Arc<CacheState> {
        self.state.load_full()
    }

    /// Publish a freshly merged snapshot.
    ///
    /// The outgoing current moves into the stale slot and `last_update`
    /// is stamped, all as a single observable transition.
    pub fn publish(&self, snapshot: Arc<Snapshot>, at: DateTime<Utc>) {
        self.state.rcu(|prev| {
            Arc::new(CacheState {
                current: Some(Arc::clone(&snapshot)),
                stale: prev.current.clone(),
                last_update: Some(at),
            })
        });
    }

    /// Drop both slots and the timestamp.
    ///
    /// Used by the direct-invalidate policy when background merging is
    /// disabled.
    pub fn clear(&self) {
        self.state.store(Arc::new(CacheState::empty()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::{ProductCode, ProductRecord};

    fn snapshot(codes: &[&str]) -> Arc<Snapshot> {
        Arc::new(Snapshot::from_records(
            codes
                .iter()
                .map(|c| ProductRecord::new(ProductCode::new(*c).unwrap()))
                .collect(),
        ))
    }

    #[test]
    fn test_store_starts_empty() {
        let store = CacheStore::new();
        let state = store.load();
        assert!(state.current.is_none());
        assert!(state.stale.is_none());
        assert!(state.last_update.is_none());
    }

    #[test]
    fn test_publish_moves_current_to_stale() {
        let store = CacheStore::new();
        let now = Utc::now();

        store.publish(snapshot(&["OLD001"]), now);
        store.publish(snapshot(&["NEW001"]), now + chrono::Duration::seconds(10));

        let state = store.load();
        let current = state.current.as_ref().unwrap();
        let stale = state.stale.as_ref().unwrap();
        assert!(current.get(&ProductCode::new("NEW001").unwrap()).is_some());
        assert!(stale.get(&ProductCode::new("OLD001").unwrap()).is_some());
        assert_eq!(state.last_update, Some(now + chrono::Duration::seconds(10)));
    }

    #[test]
    fn test_stale_is_one_generation_only() {
        let store = CacheStore::new();
        let now = Utc::now();

        store.publish(snapshot(&["GEN1"]), now);
        store.publish(snapshot(&["GEN2"]), now);
        store.publish(snapshot(&["GEN3"]), now);

        let state = store.load();
        let stale = state.stale.as_ref().unwrap();
        assert!(stale.get(&ProductCode::new("GEN2").unwrap()).is_some());
        assert!(stale.get(&ProductCode::new("GEN1").unwrap()).is_none());
    }

    #[test]
    fn test_clear_empties_everything() {
        let store = CacheStore::new();
        store.publish(snapshot(&["A"]), Utc::now());
        store.publish(snapshot(&["B"]), Utc::now());

        store.clear();

        let state = store.load();
        assert!(state.current.is_none());
        assert!(state.stale.is_none());
        assert!(state.last_update.is_none());
    }

    #[test]
    fn test_freshness_window() {
        let store = CacheStore::new();
        let published_at = Utc::now();
        store.publish(snapshot(&["A"]), published_at);

        let state = store.load();
        let validity = Duration::from_secs(300);
        assert!(state.is_fresh(published_at + chrono::Duration::seconds(60), validity));
        assert!(!state.is_fresh(published_at + chrono::Duration::seconds(301), validity));
    }

    #[test]
    fn test_empty_state_is_never_fresh() {
        let state = CacheState::empty();
        assert!(!state.is_fresh(Utc::now(), Duration::from_secs(300)));
        assert!(!state.is_stale_servable(Utc::now(), Duration::from_secs(3600)));
    }

    #[test]
    fn test_stale_servable_within_retention() {
        let store = CacheStore::new();
        let t0 = Utc::now();
        store.publish(snapshot(&["A"]), t0);
        store.publish(snapshot(&["B"]), t0 + chrono::Duration::seconds(10));

        let state = store.load();
        let retention = Duration::from_secs(100);
        assert!(state.is_stale_servable(t0 + chrono::Duration::seconds(60), retention));
        assert!(!state.is_stale_servable(t0 + chrono::Duration::seconds(200), retention));
    }

    #[test]
    fn test_readers_keep_their_snapshot_across_publishes() {
        let store = CacheStore::new();
        store.publish(snapshot(&["A"]), Utc::now());

        let pinned = store.load();
        store.publish(snapshot(&["B"]), Utc::now());
        store.clear();

        // The pinned state is unaffected by later publications.
        assert!(pinned
            .current
            .as_ref()
            .unwrap()
            .get(&ProductCode::new("A").unwrap())
            .is_some());
    }
}
