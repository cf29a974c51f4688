//! Mosaic Catalog - Cache/Merge Orchestration
//!
//! The read-optimized product catalog: a cache of fully-joined product
//! records refreshed asynchronously from the upstream sources.
//!
//! # Design Philosophy
//!
//! Rebuilding the joined view on every read is too expensive, so reads are
//! served from an immutable snapshot and refreshes happen out of band:
//!
//! - a source refresh marks the source dirty and arms a debounced merge;
//! - the merge pulls from every source, joins by product code, and
//!   publishes the result with an atomic three-slot swap (current, stale,
//!   last-update);
//! - readers get the current snapshot while fresh, the previous generation
//!   while a merge is executing, and a synchronous priority merge only
//!   when there is nothing servable at all.
//!
//! A reader who once observed good data never gets a torn or empty result:
//! failed merges change nothing, and the slots swap as one value.

pub mod executor;
pub mod facade;
pub mod invalidation;
pub mod metrics;
pub mod scheduler;
pub mod store;

pub use executor::MergeExecutor;
pub use facade::{CacheStatus, CatalogFacade};
pub use invalidation::{SourceInvalidationTracker, SourceState};
pub use metrics::{MergeMetrics, MergeMetricsSnapshot};
pub use scheduler::{MergeScheduler, MergeWindow};
pub use store::{CacheState, CacheStore};
