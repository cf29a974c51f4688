//! Mosaic Test Utilities
//!
//! Centralized test infrastructure for the Mosaic workspace:
//! - A generic in-memory [`FakeSource`] implementing every source trait
//! - [`FakeSources`], a ready-made bundle behind a [`SourceSet`]
//! - Row fixtures for common scenarios
//!
//! Fakes support failure injection (a persistent error until cleared) and
//! an artificial fetch delay for exercising merge-in-progress windows
//! under paused tokio time.

// Re-export the manual clock for convenience
pub use mosaic_core::ManualClock;

use async_trait::async_trait;
use chrono::NaiveDate;
use mosaic_core::{CatalogResult, SourceError};
use mosaic_sources::{
    AttributeRow, CatalogAttributeSource, ConsumedMaterialSource, ConsumptionRow, DifficultyRow,
    ErpPriceRow, ErpPriceSource, ErpStockRow, ErpStockSource, EshopPriceRow, EshopPriceSource,
    EshopStockRow, EshopStockSource, LotRow, LotSource, ManufactureCostRow, ManufactureCostSource,
    ManufactureDifficultySource, ManufactureTemplateSource, PurchaseHistorySource,
    PurchaseOrderRow, PurchaseOrderSource, PurchaseRow, SalesHistorySource, SalesRow, SourceSet,
    StockTakingRow, StockTakingSource, TemplateRow, TransportBoxRow, TransportBoxSource,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// FAKE SOURCE
// ============================================================================

/// In-memory source fake with settable rows, failure injection, and an
/// optional fetch delay.
#[derive(Debug, Default)]
pub struct FakeSource<R> {
    rows: Mutex<Vec<R>>,
    fail_with: Mutex<Option<SourceError>>,
    delay: Mutex<Option<Duration>>,
    fetch_count: AtomicU64,
}

impl<R: Clone> FakeSource<R> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            delay: Mutex::new(None),
            fetch_count: AtomicU64::new(0),
        }
    }

    /// Replace the rows the next fetch returns.
    pub fn set_rows(&self, rows: Vec<R>) {
        *self.rows.lock().unwrap_or_else(|e| e.into_inner()) = rows;
    }

    /// Append one row.
    pub fn push_row(&self, row: R) {
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(row);
    }

    /// Fail every fetch with this error until [`clear_failure`] is called.
    ///
    /// [`clear_failure`]: FakeSource::clear_failure
    pub fn fail_with(&self, error: SourceError) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Stop failing.
    pub fn clear_failure(&self) {
        *self.fail_with.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Delay every fetch by this long (tokio time; pausable in tests).
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// How many fetches have been attempted.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    async fn fetch(&self) -> CatalogResult<Vec<R>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .fail_with
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(error) = failure {
            return Err(error.into());
        }

        Ok(self.rows.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

#[async_trait]
impl CatalogAttributeSource for FakeSource<AttributeRow> {
    async fn fetch_attributes(&self) -> CatalogResult<Vec<AttributeRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl SalesHistorySource for FakeSource<SalesRow> {
    async fn fetch_sales(&self, _history_days: u32) -> CatalogResult<Vec<SalesRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl ErpStockSource for FakeSource<ErpStockRow> {
    async fn fetch_erp_stock(&self) -> CatalogResult<Vec<ErpStockRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl EshopStockSource for FakeSource<EshopStockRow> {
    async fn fetch_eshop_stock(&self) -> CatalogResult<Vec<EshopStockRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl ConsumedMaterialSource for FakeSource<ConsumptionRow> {
    async fn fetch_consumed(&self, _history_days: u32) -> CatalogResult<Vec<ConsumptionRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl PurchaseHistorySource for FakeSource<PurchaseRow> {
    async fn fetch_purchases(&self, _history_days: u32) -> CatalogResult<Vec<PurchaseRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl LotSource for FakeSource<LotRow> {
    async fn fetch_lots(&self) -> CatalogResult<Vec<LotRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl EshopPriceSource for FakeSource<EshopPriceRow> {
    async fn fetch_eshop_prices(&self) -> CatalogResult<Vec<EshopPriceRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl ErpPriceSource for FakeSource<ErpPriceRow> {
    async fn fetch_erp_prices(&self) -> CatalogResult<Vec<ErpPriceRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl ManufactureTemplateSource for FakeSource<TemplateRow> {
    async fn fetch_templates(&self) -> CatalogResult<Vec<TemplateRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl ManufactureCostSource for FakeSource<ManufactureCostRow> {
    async fn fetch_costs(&self, _history_days: u32) -> CatalogResult<Vec<ManufactureCostRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl ManufactureDifficultySource for FakeSource<DifficultyRow> {
    async fn fetch_difficulties(&self) -> CatalogResult<Vec<DifficultyRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl TransportBoxSource for FakeSource<TransportBoxRow> {
    async fn fetch_transport_boxes(&self) -> CatalogResult<Vec<TransportBoxRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl StockTakingSource for FakeSource<StockTakingRow> {
    async fn fetch_stock_takings(&self) -> CatalogResult<Vec<StockTakingRow>> {
        self.fetch().await
    }
}

#[async_trait]
impl PurchaseOrderSource for FakeSource<PurchaseOrderRow> {
    async fn fetch_purchase_orders(&self) -> CatalogResult<Vec<PurchaseOrderRow>> {
        self.fetch().await
    }
}

// ============================================================================
// FAKE SOURCE BUNDLE
// ============================================================================

/// One fake per upstream source, with handles kept for test manipulation.
pub struct FakeSources {
    pub attributes: Arc<FakeSource<AttributeRow>>,
    pub sales: Arc<FakeSource<SalesRow>>,
    pub erp_stock: Arc<FakeSource<ErpStockRow>>,
    pub eshop_stock: Arc<FakeSource<EshopStockRow>>,
    pub consumed_materials: Arc<FakeSource<ConsumptionRow>>,
    pub purchases: Arc<FakeSource<PurchaseRow>>,
    pub lots: Arc<FakeSource<LotRow>>,
    pub eshop_prices: Arc<FakeSource<EshopPriceRow>>,
    pub erp_prices: Arc<FakeSource<ErpPriceRow>>,
    pub templates: Arc<FakeSource<TemplateRow>>,
    pub manufacture_costs: Arc<FakeSource<ManufactureCostRow>>,
    pub difficulties: Arc<FakeSource<DifficultyRow>>,
    pub transport_boxes: Arc<FakeSource<TransportBoxRow>>,
    pub stock_takings: Arc<FakeSource<StockTakingRow>>,
    pub purchase_orders: Arc<FakeSource<PurchaseOrderRow>>,
}

impl FakeSources {
    /// All sources empty and healthy.
    pub fn new() -> Self {
        Self {
            attributes: Arc::new(FakeSource::new()),
            sales: Arc::new(FakeSource::new()),
            erp_stock: Arc::new(FakeSource::new()),
            eshop_stock: Arc::new(FakeSource::new()),
            consumed_materials: Arc::new(FakeSource::new()),
            purchases: Arc::new(FakeSource::new()),
            lots: Arc::new(FakeSource::new()),
            eshop_prices: Arc::new(FakeSource::new()),
            erp_prices: Arc::new(FakeSource::new()),
            templates: Arc::new(FakeSource::new()),
            manufacture_costs: Arc::new(FakeSource::new()),
            difficulties: Arc::new(FakeSource::new()),
            transport_boxes: Arc::new(FakeSource::new()),
            stock_takings: Arc::new(FakeSource::new()),
            purchase_orders: Arc::new(FakeSource::new()),
        }
    }

    /// Bundle the fakes for injection.
    pub fn source_set(&self) -> SourceSet {
        SourceSet {
            attributes: self.attributes.clone(),
            sales: self.sales.clone(),
            erp_stock: self.erp_stock.clone(),
            eshop_stock: self.eshop_stock.clone(),
            consumed_materials: self.consumed_materials.clone(),
            purchases: self.purchases.clone(),
            lots: self.lots.clone(),
            eshop_prices: self.eshop_prices.clone(),
            erp_prices: self.erp_prices.clone(),
            templates: self.templates.clone(),
            manufacture_costs: self.manufacture_costs.clone(),
            difficulties: self.difficulties.clone(),
            transport_boxes: self.transport_boxes.clone(),
            stock_takings: self.stock_takings.clone(),
            purchase_orders: self.purchase_orders.clone(),
        }
    }
}

impl Default for FakeSources {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A small but fully-populated set of rows describing one product.
pub fn seeded_sources(product_code: &str) -> FakeSources {
    let fakes = FakeSources::new();
    let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();

    fakes
        .attributes
        .set_rows(vec![AttributeRow::new(product_code, Some("Seeded product"))]);
    fakes
        .sales
        .set_rows(vec![SalesRow::new(product_code, date, 4.0, 600.0)]);
    fakes.erp_stock.set_rows(vec![ErpStockRow {
        product_code: product_code.to_string(),
        quantity: 12.0,
    }]);
    fakes.eshop_prices.set_rows(vec![EshopPriceRow {
        product_code: product_code.to_string(),
        price: 150.0,
        price_with_vat: 181.5,
    }]);

    fakes
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::SourceKind;

    #[tokio::test]
    async fn test_fake_returns_set_rows() {
        let fake: FakeSource<AttributeRow> = FakeSource::new();
        fake.set_rows(vec![AttributeRow::new("A1", None)]);

        let rows = fake.fetch_attributes().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(fake.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_fake_fails_until_cleared() {
        let fake: FakeSource<AttributeRow> = FakeSource::new();
        fake.fail_with(SourceError::Unavailable {
            kind: SourceKind::CatalogAttributes,
            reason: "down".to_string(),
        });

        assert!(fake.fetch_attributes().await.is_err());
        assert!(fake.fetch_attributes().await.is_err());

        fake.clear_failure();
        assert!(fake.fetch_attributes().await.is_ok());
        assert_eq!(fake.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_seeded_sources_cover_several_sections() {
        let fakes = seeded_sources("SEED-1");
        assert_eq!(fakes.attributes.fetch_attributes().await.unwrap().len(), 1);
        assert_eq!(fakes.sales.fetch_sales(365).await.unwrap().len(), 1);
        assert_eq!(fakes.erp_stock.fetch_erp_stock().await.unwrap().len(), 1);
        assert_eq!(
            fakes.eshop_prices.fetch_eshop_prices().await.unwrap().len(),
            1
        );
    }
}
