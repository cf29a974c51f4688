//! Merge execution: fetch everything, join by product code, publish.
//!
//! One merge pulls from every upstream collaborator concurrently, folds
//! the rows into product records keyed by code, and publishes the result
//! as a new snapshot. Executions are serialized by an internal run-lock;
//! the `in_progress` flag is observable without touching that lock.
//!
//! A merge either publishes a complete snapshot or changes nothing: any
//! collaborator failure aborts the whole merge and the previous cache
//! state stays reachable.

use crate::invalidation::SourceInvalidationTracker;
use crate::metrics::{MergeMetrics, MergeMetricsSnapshot};
use crate::store::CacheStore;
use mosaic_core::{
    CatalogResult, Clock, DataSourceOptions, ProductCode, ProductRecord, Snapshot, SourceKind,
};
use mosaic_sources::SourceSet;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Fetches from all upstream sources and publishes merged snapshots.
pub struct MergeExecutor {
    sources: SourceSet,
    store: Arc<CacheStore>,
    tracker: Arc<SourceInvalidationTracker>,
    clock: Arc<dyn Clock>,
    options: DataSourceOptions,
    metrics: Arc<MergeMetrics>,
    run_lock: Mutex<()>,
    in_progress: AtomicBool,
}

impl MergeExecutor {
    pub fn new(
        sources: SourceSet,
        store: Arc<CacheStore>,
        tracker: Arc<SourceInvalidationTracker>,
        clock: Arc<dyn Clock>,
        options: DataSourceOptions,
    ) -> Self {
        Self {
            sources,
            store,
            tracker,
            clock,
            options,
            metrics: Arc::new(MergeMetrics::new()),
            run_lock: Mutex::new(()),
            in_progress: AtomicBool::new(false),
        }
    }

    /// Whether a merge is executing right now.
    pub fn is_merge_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Current counters.
    pub fn metrics_snapshot(&self) -> MergeMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Run one merge to completion and publish the result.
    ///
    /// Serialized: a second caller waits for the first execution to finish,
    /// then runs its own. There is no mid-merge cancellation; duration is
    /// bounded only by the collaborators' own timeouts.
    pub async fn execute_merge(&self) -> CatalogResult<Arc<Snapshot>> {
        let _guard = self.run_lock.lock().await;
        self.in_progress.store(true, Ordering::SeqCst);
        let started = Instant::now();
        self.metrics.merges_started.fetch_add(1, Ordering::Relaxed);

        // The dirty set now reflects what arrives after this point; this
        // merge picks up everything recorded before it.
        self.tracker.acknowledge_all();

        let outcome = match self.fetch_and_join().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let now = self.clock.now();
                self.store.publish(Arc::clone(&snapshot), now);

                let duration_ms = started.elapsed().as_millis() as u64;
                self.metrics.merges_succeeded.fetch_add(1, Ordering::Relaxed);
                self.metrics
                    .last_snapshot_records
                    .store(snapshot.len() as u64, Ordering::Relaxed);
                self.metrics
                    .last_merge_duration_ms
                    .store(duration_ms, Ordering::Relaxed);

                tracing::info!(
                    records = snapshot.len(),
                    duration_ms,
                    "Merge published new snapshot"
                );
                Ok(snapshot)
            }
            Err(error) => {
                self.metrics.merges_failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %error, "Merge failed, cache left untouched");
                Err(error)
            }
        };

        self.in_progress.store(false, Ordering::SeqCst);
        outcome
    }

    /// Fetch from every collaborator and join the rows into a snapshot.
    async fn fetch_and_join(&self) -> CatalogResult<Snapshot> {
        let s = &self.sources;
        let o = &self.options;

        let (
            attributes,
            sales,
            erp_stock,
            eshop_stock,
            consumed,
            purchases,
            lots,
            eshop_prices,
            erp_prices,
            templates,
            costs,
            difficulties,
            transport_boxes,
            stock_takings,
            purchase_orders,
        ) = tokio::try_join!(
            s.attributes.fetch_attributes(),
            s.sales.fetch_sales(o.sales_history_days),
            s.erp_stock.fetch_erp_stock(),
            s.eshop_stock.fetch_eshop_stock(),
            s.consumed_materials.fetch_consumed(o.consumed_history_days),
            s.purchases.fetch_purchases(o.purchase_history_days),
            s.lots.fetch_lots(),
            s.eshop_prices.fetch_eshop_prices(),
            s.erp_prices.fetch_erp_prices(),
            s.templates.fetch_templates(),
            s.manufacture_costs.fetch_costs(o.manufacture_history_days),
            s.difficulties.fetch_difficulties(),
            s.transport_boxes.fetch_transport_boxes(),
            s.stock_takings.fetch_stock_takings(),
            s.purchase_orders.fetch_purchase_orders(),
        )?;

        let mut records: BTreeMap<ProductCode, ProductRecord> = BTreeMap::new();

        for row in attributes {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::CatalogAttributes)
            {
                rec.name = row.name;
            }
        }
        for row in sales {
            if let Some(rec) = self.entry(&mut records, &row.product_code, SourceKind::Sales) {
                rec.sales_history.push(row.entry);
            }
        }
        for row in erp_stock {
            if let Some(rec) = self.entry(&mut records, &row.product_code, SourceKind::ErpStock) {
                rec.stock.erp += row.quantity;
            }
        }
        for row in eshop_stock {
            if let Some(rec) = self.entry(&mut records, &row.product_code, SourceKind::EshopStock) {
                rec.stock.eshop += row.quantity;
            }
        }
        for row in consumed {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::ConsumedMaterials)
            {
                rec.consumption_history.push(row.entry);
            }
        }
        for row in purchases {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::PurchaseHistory)
            {
                rec.purchase_history.push(row.entry);
            }
        }
        for row in lots {
            if let Some(rec) = self.entry(&mut records, &row.product_code, SourceKind::Lots) {
                rec.lots.push(row.lot);
            }
        }
        for row in eshop_prices {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::EshopPrices)
            {
                rec.prices.eshop_price = Some(row.price);
                rec.prices.eshop_price_with_vat = Some(row.price_with_vat);
            }
        }
        for row in erp_prices {
            if let Some(rec) = self.entry(&mut records, &row.product_code, SourceKind::ErpPrices) {
                rec.prices.erp_price = row.price;
                rec.prices.erp_purchase_price = row.purchase_price;
            }
        }
        for row in templates {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::ManufactureTemplates)
            {
                rec.manufacture_template = Some(mosaic_core::ManufactureTemplate {
                    template_name: row.template_name,
                    batch_size: row.batch_size,
                });
            }
        }
        for row in costs {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::ManufactureCost)
            {
                rec.manufacture_cost_history.push(row.entry);
            }
        }
        for row in difficulties {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::ManufactureDifficulty)
            {
                rec.manufacture_difficulty = Some(mosaic_core::ManufactureDifficulty {
                    difficulty: row.difficulty,
                    valid_from: row.valid_from,
                });
            }
        }
        for row in transport_boxes {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::TransportBoxes)
            {
                rec.stock.in_transport_boxes += row.quantity;
            }
        }
        for row in stock_takings {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::StockTakings)
            {
                rec.stock_takings.push(row.entry);
            }
        }
        for row in purchase_orders {
            if let Some(rec) =
                self.entry(&mut records, &row.product_code, SourceKind::PurchaseOrders)
            {
                rec.open_purchase_orders.push(row.line);
            }
        }

        // Upstream feeds deliver in no particular order.
        for rec in records.values_mut() {
            rec.sales_history.sort_by_key(|e| e.date);
            rec.purchase_history.sort_by_key(|e| e.date);
            rec.consumption_history.sort_by_key(|e| e.date);
            rec.manufacture_cost_history.sort_by_key(|e| e.date);
            rec.stock_takings.sort_by_key(|e| e.taken_at);
        }

        Ok(Snapshot::from_records(records.into_values().collect()))
    }

    /// Resolve the record a row folds into, skipping rows without a code.
    fn entry<'a>(
        &self,
        records: &'a mut BTreeMap<ProductCode, ProductRecord>,
        raw_code: &str,
        source: SourceKind,
    ) -> Option<&'a mut ProductRecord> {
        match ProductCode::new(raw_code) {
            Some(code) => Some(
                records
                    .entry(code.clone())
                    .or_insert_with(|| ProductRecord::new(code)),
            ),
            None => {
                tracing::warn!(source = %source, "Skipping row with missing product code");
                self.metrics
                    .rows_skipped_missing_code
                    .fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mosaic_core::{ManualClock, SourceError};
    use mosaic_sources::{AttributeRow, ErpStockRow, SalesRow};
    use mosaic_test_utils::FakeSources;

    fn executor(fakes: &FakeSources, clock: Arc<ManualClock>) -> (Arc<CacheStore>, MergeExecutor) {
        let store = Arc::new(CacheStore::new());
        let tracker = Arc::new(SourceInvalidationTracker::new(clock.clone()));
        let executor = MergeExecutor::new(
            fakes.source_set(),
            Arc::clone(&store),
            tracker,
            clock,
            DataSourceOptions::default(),
        );
        (store, executor)
    }

    fn code(s: &str) -> ProductCode {
        ProductCode::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_merge_joins_rows_by_code() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![
            AttributeRow::new("A1", Some("Widget")),
            AttributeRow::new("B2", Some("Gadget")),
        ]);
        fakes.erp_stock.set_rows(vec![ErpStockRow {
            product_code: "A1".to_string(),
            quantity: 7.0,
        }]);
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        fakes
            .sales
            .set_rows(vec![SalesRow::new("A1", date, 2.0, 300.0)]);

        let clock = Arc::new(ManualClock::default());
        let (_, executor) = executor(&fakes, clock);

        let snapshot = executor.execute_merge().await.unwrap();
        assert_eq!(snapshot.len(), 2);

        let a1 = snapshot.get(&code("A1")).unwrap();
        assert_eq!(a1.name.as_deref(), Some("Widget"));
        assert_eq!(a1.stock.erp, 7.0);
        assert_eq!(a1.sales_history.len(), 1);

        let b2 = snapshot.get(&code("B2")).unwrap();
        assert_eq!(b2.stock.erp, 0.0);
        assert!(b2.sales_history.is_empty());
    }

    #[tokio::test]
    async fn test_rows_for_unknown_codes_create_records() {
        // A source may know a product before the attribute feed does.
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![AttributeRow::new("A1", None)]);
        fakes.erp_stock.set_rows(vec![ErpStockRow {
            product_code: "ORPHAN".to_string(),
            quantity: 1.0,
        }]);

        let clock = Arc::new(ManualClock::default());
        let (_, executor) = executor(&fakes, clock);

        let snapshot = executor.execute_merge().await.unwrap();
        assert!(snapshot.get(&code("ORPHAN")).is_some());
    }

    #[tokio::test]
    async fn test_rows_with_empty_codes_are_skipped() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![
            AttributeRow::new("A1", Some("Widget")),
            AttributeRow::new("", Some("No code")),
            AttributeRow::new("   ", Some("Blank code")),
        ]);

        let clock = Arc::new(ManualClock::default());
        let (_, executor) = executor(&fakes, clock);

        let snapshot = executor.execute_merge().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(executor.metrics_snapshot().rows_skipped_missing_code, 2);
    }

    #[tokio::test]
    async fn test_merge_publishes_with_clock_timestamp() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![AttributeRow::new("A1", None)]);

        let clock = Arc::new(ManualClock::default());
        let merge_time = clock.now();
        let (store, executor) = executor(&fakes, clock);

        executor.execute_merge().await.unwrap();

        let state = store.load();
        assert_eq!(state.last_update, Some(merge_time));
        assert!(state.stale.is_none());
    }

    #[tokio::test]
    async fn test_second_merge_shifts_generations() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![AttributeRow::new("OLD001", None)]);

        let clock = Arc::new(ManualClock::default());
        let (store, executor) = executor(&fakes, clock);

        executor.execute_merge().await.unwrap();

        fakes.attributes.set_rows(vec![AttributeRow::new("NEW001", None)]);
        executor.execute_merge().await.unwrap();

        let state = store.load();
        assert!(state.current.as_ref().unwrap().get(&code("NEW001")).is_some());
        assert!(state.stale.as_ref().unwrap().get(&code("OLD001")).is_some());
    }

    #[tokio::test]
    async fn test_failed_merge_leaves_cache_untouched() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![AttributeRow::new("KEEP", None)]);

        let clock = Arc::new(ManualClock::default());
        let (store, executor) = executor(&fakes, clock);

        executor.execute_merge().await.unwrap();
        let before = store.load();

        fakes.erp_stock.fail_with(SourceError::Unavailable {
            kind: SourceKind::ErpStock,
            reason: "connection refused".to_string(),
        });

        let result = executor.execute_merge().await;
        assert!(result.is_err());
        assert!(!executor.is_merge_in_progress());

        let after = store.load();
        assert_eq!(after.last_update, before.last_update);
        assert!(after.current.as_ref().unwrap().get(&code("KEEP")).is_some());
        assert!(after.stale.is_none());
        assert_eq!(executor.metrics_snapshot().merges_failed, 1);
    }

    #[tokio::test]
    async fn test_merged_snapshot_has_unique_nonempty_codes() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![
            AttributeRow::new("A1", None),
            AttributeRow::new("A1", Some("duplicate")),
            AttributeRow::new("B2", None),
            AttributeRow::new("", None),
        ]);
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        fakes.sales.set_rows(vec![
            SalesRow::new("A1", date, 1.0, 10.0),
            SalesRow::new("", date, 9.0, 90.0),
        ]);

        let clock = Arc::new(ManualClock::default());
        let (_, executor) = executor(&fakes, clock);

        let snapshot = executor.execute_merge().await.unwrap();
        let codes: Vec<_> = snapshot.codes().map(|c| c.as_str().to_string()).collect();
        let mut unique = codes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(codes, unique);
        assert!(codes.iter().all(|c| !c.trim().is_empty()));
    }

    #[tokio::test]
    async fn test_history_entries_are_sorted_by_date() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![AttributeRow::new("A1", None)]);
        let d1 = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        fakes.sales.set_rows(vec![
            SalesRow::new("A1", d1, 1.0, 1.0),
            SalesRow::new("A1", d2, 2.0, 2.0),
            SalesRow::new("A1", d3, 3.0, 3.0),
        ]);

        let clock = Arc::new(ManualClock::default());
        let (_, executor) = executor(&fakes, clock);

        let snapshot = executor.execute_merge().await.unwrap();
        let dates: Vec<_> = snapshot
            .get(&code("A1"))
            .unwrap()
            .sales_history
            .iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(dates, vec![d2, d3, d1]);
    }

    #[tokio::test]
    async fn test_merge_clears_dirty_flags_at_start() {
        let fakes = FakeSources::new();
        fakes.attributes.set_rows(vec![AttributeRow::new("A1", None)]);

        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(CacheStore::new());
        let tracker = Arc::new(SourceInvalidationTracker::new(clock.clone()));
        let executor = MergeExecutor::new(
            fakes.source_set(),
            store,
            Arc::clone(&tracker),
            clock,
            DataSourceOptions::default(),
        );

        tracker.record_invalidated(SourceKind::Sales);
        tracker.record_invalidated(SourceKind::Lots);
        assert_eq!(tracker.dirty_sources().len(), 2);

        executor.execute_merge().await.unwrap();
        assert!(tracker.dirty_sources().is_empty());
    }
}
