//! Async traits for the upstream collaborators.
//!
//! Each trait exposes a single "fetch current state" operation. The
//! history-scoped sources take the window (in days) as a parameter; the
//! merge executor supplies it from `DataSourceOptions`. Implementations
//! wrap their own resilience policy (retries, circuit breaking, timeouts);
//! an error returned here means the fetch has definitively failed.

use crate::rows::{
    AttributeRow, ConsumptionRow, DifficultyRow, ErpPriceRow, ErpStockRow, EshopPriceRow,
    EshopStockRow, LotRow, ManufactureCostRow, PurchaseOrderRow, PurchaseRow, SalesRow,
    StockTakingRow, TemplateRow, TransportBoxRow,
};
use async_trait::async_trait;
use mosaic_core::CatalogResult;

/// Catalog attributes: product names and the base record set.
#[async_trait]
pub trait CatalogAttributeSource: Send + Sync {
    async fn fetch_attributes(&self) -> CatalogResult<Vec<AttributeRow>>;
}

/// Invoiced sales history.
#[async_trait]
pub trait SalesHistorySource: Send + Sync {
    async fn fetch_sales(&self, history_days: u32) -> CatalogResult<Vec<SalesRow>>;
}

/// Physical stock in the ERP warehouse.
#[async_trait]
pub trait ErpStockSource: Send + Sync {
    async fn fetch_erp_stock(&self) -> CatalogResult<Vec<ErpStockRow>>;
}

/// Stock quantities as published by the eshop.
#[async_trait]
pub trait EshopStockSource: Send + Sync {
    async fn fetch_eshop_stock(&self) -> CatalogResult<Vec<EshopStockRow>>;
}

/// Materials consumed by manufacturing.
#[async_trait]
pub trait ConsumedMaterialSource: Send + Sync {
    async fn fetch_consumed(&self, history_days: u32) -> CatalogResult<Vec<ConsumptionRow>>;
}

/// Goods-received (purchase) history.
#[async_trait]
pub trait PurchaseHistorySource: Send + Sync {
    async fn fetch_purchases(&self, history_days: u32) -> CatalogResult<Vec<PurchaseRow>>;
}

/// Lot-level inventory.
#[async_trait]
pub trait LotSource: Send + Sync {
    async fn fetch_lots(&self) -> CatalogResult<Vec<LotRow>>;
}

/// Eshop sale prices.
#[async_trait]
pub trait EshopPriceSource: Send + Sync {
    async fn fetch_eshop_prices(&self) -> CatalogResult<Vec<EshopPriceRow>>;
}

/// ERP price list.
#[async_trait]
pub trait ErpPriceSource: Send + Sync {
    async fn fetch_erp_prices(&self) -> CatalogResult<Vec<ErpPriceRow>>;
}

/// Manufacture templates (recipes).
#[async_trait]
pub trait ManufactureTemplateSource: Send + Sync {
    async fn fetch_templates(&self) -> CatalogResult<Vec<TemplateRow>>;
}

/// Calculated manufacturing cost history.
#[async_trait]
pub trait ManufactureCostSource: Send + Sync {
    async fn fetch_costs(&self, history_days: u32) -> CatalogResult<Vec<ManufactureCostRow>>;
}

/// Manufacture difficulty settings.
#[async_trait]
pub trait ManufactureDifficultySource: Send + Sync {
    async fn fetch_difficulties(&self) -> CatalogResult<Vec<DifficultyRow>>;
}

/// Stock held in transport boxes.
#[async_trait]
pub trait TransportBoxSource: Send + Sync {
    async fn fetch_transport_boxes(&self) -> CatalogResult<Vec<TransportBoxRow>>;
}

/// Stock-taking (physical count) history.
#[async_trait]
pub trait StockTakingSource: Send + Sync {
    async fn fetch_stock_takings(&self) -> CatalogResult<Vec<StockTakingRow>>;
}

/// Open purchase-order lines.
#[async_trait]
pub trait PurchaseOrderSource: Send + Sync {
    async fn fetch_purchase_orders(&self) -> CatalogResult<Vec<PurchaseOrderRow>>;
}
