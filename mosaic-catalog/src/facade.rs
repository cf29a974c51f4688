//! The public catalog surface.
//!
//! Composes the store, tracker, scheduler, and executor into the
//! read/write policy:
//!
//! - reads serve the current snapshot while it is fresh, fall back to the
//!   previous generation while a merge is executing, and only as a last
//!   resort run a priority merge on the calling path;
//! - source refreshes either schedule a debounced background merge
//!   (default) or clear the cache synchronously when background merging
//!   is disabled.

use crate::executor::MergeExecutor;
use crate::invalidation::SourceInvalidationTracker;
use crate::metrics::MergeMetricsSnapshot;
use crate::scheduler::MergeScheduler;
use crate::store::CacheStore;
use chrono::{DateTime, Utc};
use mosaic_core::{
    CatalogCacheOptions, CatalogResult, Clock, DataSourceOptions, Page, PageRequest, ProductCode,
    ProductFilter, ProductRecord, Snapshot, SourceKind,
};
use mosaic_sources::SourceSet;
use std::sync::Arc;

/// Point-in-time view of the cache, for health endpoints and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    pub last_update: Option<DateTime<Utc>>,
    pub is_fresh: bool,
    pub merge_in_progress: bool,
    pub current_records: Option<usize>,
    pub stale_records: Option<usize>,
    pub dirty_sources: Vec<SourceKind>,
}

/// The merged product catalog.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct CatalogFacade {
    options: CatalogCacheOptions,
    clock: Arc<dyn Clock>,
    store: Arc<CacheStore>,
    tracker: Arc<SourceInvalidationTracker>,
    executor: Arc<MergeExecutor>,
    scheduler: MergeScheduler,
}

impl CatalogFacade {
    /// Wire up the catalog. Validates both option groups and spawns the
    /// scheduler worker, so this must run within a tokio runtime.
    pub fn new(
        sources: SourceSet,
        clock: Arc<dyn Clock>,
        cache_options: CatalogCacheOptions,
        source_options: DataSourceOptions,
    ) -> CatalogResult<Self> {
        cache_options.validate()?;
        source_options.validate()?;

        let store = Arc::new(CacheStore::new());
        let tracker = Arc::new(SourceInvalidationTracker::new(Arc::clone(&clock)));
        let executor = Arc::new(MergeExecutor::new(
            sources,
            Arc::clone(&store),
            Arc::clone(&tracker),
            Arc::clone(&clock),
            source_options,
        ));
        let scheduler = MergeScheduler::new(Arc::clone(&executor), &cache_options);

        Ok(Self {
            options: cache_options,
            clock,
            store,
            tracker,
            executor,
            scheduler,
        })
    }

    /// Get the merged catalog.
    ///
    /// Serves the current snapshot while fresh, the previous generation
    /// while a merge is executing (when allowed and young enough), and
    /// otherwise runs a priority merge on the calling path. Only that
    /// last branch blocks, and only it can fail.
    pub async fn get_all(&self) -> CatalogResult<Arc<Snapshot>> {
        let state = self.store.load();
        let now = self.clock.now();

        if state.is_fresh(now, self.options.cache_validity_period) {
            if let Some(current) = &state.current {
                return Ok(Arc::clone(current));
            }
        }

        if self.options.allow_stale_data_during_merge
            && self.executor.is_merge_in_progress()
            && state.is_stale_servable(now, self.options.stale_data_retention_period)
        {
            if let Some(stale) = &state.stale {
                tracing::debug!("Serving previous-generation snapshot while merge executes");
                return Ok(Arc::clone(stale));
            }
        }

        tracing::info!("No servable cached snapshot, running priority merge");
        self.executor.execute_merge().await
    }

    /// Get one filtered page of the merged catalog.
    ///
    /// Snapshot choice follows the same policy as [`get_all`]. Degenerate
    /// pagination input is clamped, never an error.
    ///
    /// [`get_all`]: CatalogFacade::get_all
    pub async fn get_page(
        &self,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> CatalogResult<Page<ProductRecord>> {
        let snapshot = self.get_all().await?;
        let total = snapshot.iter().filter(|r| filter.matches(r)).count();
        let matches = snapshot.iter().filter(|r| filter.matches(r)).cloned();
        Ok(Page::from_iter(page, total, matches))
    }

    pub fn refresh_sales_data(&self) {
        self.invalidate(SourceKind::Sales);
    }

    pub fn refresh_attribute_data(&self) {
        self.invalidate(SourceKind::CatalogAttributes);
    }

    pub fn refresh_erp_stock_data(&self) {
        self.invalidate(SourceKind::ErpStock);
    }

    pub fn refresh_eshop_stock_data(&self) {
        self.invalidate(SourceKind::EshopStock);
    }

    pub fn refresh_consumed_material_data(&self) {
        self.invalidate(SourceKind::ConsumedMaterials);
    }

    pub fn refresh_purchase_history_data(&self) {
        self.invalidate(SourceKind::PurchaseHistory);
    }

    pub fn refresh_lot_data(&self) {
        self.invalidate(SourceKind::Lots);
    }

    pub fn refresh_eshop_price_data(&self) {
        self.invalidate(SourceKind::EshopPrices);
    }

    pub fn refresh_erp_price_data(&self) {
        self.invalidate(SourceKind::ErpPrices);
    }

    pub fn refresh_manufacture_template_data(&self) {
        self.invalidate(SourceKind::ManufactureTemplates);
    }

    pub fn refresh_manufacture_cost_data(&self) {
        self.invalidate(SourceKind::ManufactureCost);
    }

    /// Targeted single-record variant: the merge itself is always
    /// whole-snapshot, the code is carried for observability.
    pub fn refresh_manufacture_difficulty_settings_data(&self, product_code: &ProductCode) {
        tracing::debug!(product_code = %product_code, "Difficulty settings invalidated");
        self.invalidate(SourceKind::ManufactureDifficulty);
    }

    pub fn refresh_transport_box_data(&self) {
        self.invalidate(SourceKind::TransportBoxes);
    }

    pub fn refresh_stock_taking_data(&self) {
        self.invalidate(SourceKind::StockTakings);
    }

    pub fn refresh_purchase_order_data(&self) {
        self.invalidate(SourceKind::PurchaseOrders);
    }

    /// Current cache health.
    pub fn cache_status(&self) -> CacheStatus {
        let state = self.store.load();
        let now = self.clock.now();
        CacheStatus {
            last_update: state.last_update,
            is_fresh: state.is_fresh(now, self.options.cache_validity_period),
            merge_in_progress: self.executor.is_merge_in_progress(),
            current_records: state.current.as_ref().map(|s| s.len()),
            stale_records: state.stale.as_ref().map(|s| s.len()),
            dirty_sources: self.tracker.dirty_sources(),
        }
    }

    /// Merge activity counters.
    pub fn metrics(&self) -> MergeMetricsSnapshot {
        self.executor.metrics_snapshot()
    }

    /// Stop the background scheduler worker and wait for it.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }

    fn invalidate(&self, kind: SourceKind) {
        if self.options.enable_background_merge {
            self.tracker.record_invalidated(kind);
            self.scheduler.schedule_merge(kind);
        } else {
            tracing::debug!(source = %kind, "Background merge disabled, clearing cached snapshots");
            self.store.clear();
        }
    }
}
