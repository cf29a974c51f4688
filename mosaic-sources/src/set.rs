//! The bundle of upstream collaborators a merge pulls from.

use crate::traits::{
    CatalogAttributeSource, ConsumedMaterialSource, ErpPriceSource, ErpStockSource,
    EshopPriceSource, EshopStockSource, LotSource, ManufactureCostSource,
    ManufactureDifficultySource, ManufactureTemplateSource, PurchaseHistorySource,
    PurchaseOrderSource, SalesHistorySource, StockTakingSource, TransportBoxSource,
};
use std::sync::Arc;

/// Every upstream collaborator, supplied by dependency injection.
///
/// The merge executor holds one of these and nothing else about data
/// access. Cloning is cheap; all handles are shared.
#[derive(Clone)]
pub struct SourceSet {
    pub attributes: Arc<dyn CatalogAttributeSource>,
    pub sales: Arc<dyn SalesHistorySource>,
    pub erp_stock: Arc<dyn ErpStockSource>,
    pub eshop_stock: Arc<dyn EshopStockSource>,
    pub consumed_materials: Arc<dyn ConsumedMaterialSource>,
    pub purchases: Arc<dyn PurchaseHistorySource>,
    pub lots: Arc<dyn LotSource>,
    pub eshop_prices: Arc<dyn EshopPriceSource>,
    pub erp_prices: Arc<dyn ErpPriceSource>,
    pub templates: Arc<dyn ManufactureTemplateSource>,
    pub manufacture_costs: Arc<dyn ManufactureCostSource>,
    pub difficulties: Arc<dyn ManufactureDifficultySource>,
    pub transport_boxes: Arc<dyn TransportBoxSource>,
    pub stock_takings: Arc<dyn StockTakingSource>,
    pub purchase_orders: Arc<dyn PurchaseOrderSource>,
}
