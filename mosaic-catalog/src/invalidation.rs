//! Per-source invalidation bookkeeping.
//!
//! The tracker records which sources have been invalidated and when. It is
//! written by the refresh calls and read by whoever wants to know what the
//! next merge will pick up. Recording an invalidation has no other side
//! effect; scheduling is the scheduler's job.

use chrono::{DateTime, Utc};
use mosaic_core::{Clock, SourceKind};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Dirty flag and timestamp for one named source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceState {
    pub kind: SourceKind,
    pub dirty: bool,
    pub invalidated_at: Option<DateTime<Utc>>,
}

impl SourceState {
    fn clean(kind: SourceKind) -> Self {
        Self {
            kind,
            dirty: false,
            invalidated_at: None,
        }
    }
}

/// Tracks dirty flags for all named sources.
///
/// Updates are cheap and synchronized independently of the merge lock, so
/// concurrent refresh calls never contend with an executing merge.
pub struct SourceInvalidationTracker {
    clock: Arc<dyn Clock>,
    states: RwLock<HashMap<SourceKind, SourceState>>,
}

impl SourceInvalidationTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Mark a source dirty, stamping "now" regardless of prior state.
    ///
    /// Idempotent: re-invalidating a dirty source just refreshes the
    /// timestamp.
    pub fn record_invalidated(&self, kind: SourceKind) {
        let now = self.clock.now();
        let mut states = self.states.write().unwrap_or_else(|e| e.into_inner());
        let state = states
            .entry(kind)
            .or_insert_with(|| SourceState::clean(kind));
        state.dirty = true;
        state.invalidated_at = Some(now);
    }

    /// Clear every dirty flag.
    ///
    /// Called when a merge starts executing, so the dirty set reflects
    /// what the *next* merge would pick up.
    pub fn acknowledge_all(&self) {
        let mut states = self.states.write().unwrap_or_else(|e| e.into_inner());
        for state in states.values_mut() {
            state.dirty = false;
        }
    }

    /// The recorded state of one source, if it was ever invalidated.
    pub fn state(&self, kind: SourceKind) -> Option<SourceState> {
        self.states
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .cloned()
    }

    /// All currently dirty sources, sorted for stable logging.
    pub fn dirty_sources(&self) -> Vec<SourceKind> {
        let mut dirty: Vec<SourceKind> = self
            .states
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|s| s.dirty)
            .map(|s| s.kind)
            .collect();
        dirty.sort();
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::ManualClock;
    use std::time::Duration;

    fn tracker_with_clock() -> (Arc<ManualClock>, SourceInvalidationTracker) {
        let clock = Arc::new(ManualClock::default());
        let tracker = SourceInvalidationTracker::new(clock.clone());
        (clock, tracker)
    }

    #[test]
    fn test_untouched_source_has_no_state() {
        let (_, tracker) = tracker_with_clock();
        assert!(tracker.state(SourceKind::Sales).is_none());
        assert!(tracker.dirty_sources().is_empty());
    }

    #[test]
    fn test_record_sets_dirty_and_timestamp() {
        let (clock, tracker) = tracker_with_clock();
        let t0 = clock.now();

        tracker.record_invalidated(SourceKind::ErpStock);

        let state = tracker.state(SourceKind::ErpStock).unwrap();
        assert!(state.dirty);
        assert_eq!(state.invalidated_at, Some(t0));
    }

    #[test]
    fn test_record_is_idempotent_and_restamps() {
        let (clock, tracker) = tracker_with_clock();
        tracker.record_invalidated(SourceKind::Sales);

        clock.advance(Duration::from_secs(30));
        tracker.record_invalidated(SourceKind::Sales);

        let state = tracker.state(SourceKind::Sales).unwrap();
        assert!(state.dirty);
        assert_eq!(state.invalidated_at, Some(clock.now()));
        assert_eq!(tracker.dirty_sources(), vec![SourceKind::Sales]);
    }

    #[test]
    fn test_dirty_sources_sorted() {
        let (_, tracker) = tracker_with_clock();
        tracker.record_invalidated(SourceKind::PurchaseOrders);
        tracker.record_invalidated(SourceKind::Sales);
        tracker.record_invalidated(SourceKind::CatalogAttributes);

        let mut expected = vec![
            SourceKind::PurchaseOrders,
            SourceKind::Sales,
            SourceKind::CatalogAttributes,
        ];
        expected.sort();
        assert_eq!(tracker.dirty_sources(), expected);
    }

    #[test]
    fn test_acknowledge_all_clears_dirty_but_keeps_timestamp() {
        let (clock, tracker) = tracker_with_clock();
        tracker.record_invalidated(SourceKind::Lots);
        let stamped = clock.now();

        tracker.acknowledge_all();

        let state = tracker.state(SourceKind::Lots).unwrap();
        assert!(!state.dirty);
        assert_eq!(state.invalidated_at, Some(stamped));
        assert!(tracker.dirty_sources().is_empty());
    }
}
