//! Product record types.
//!
//! A [`ProductRecord`] is the unit of the merged catalog view. Each of its
//! sections is populated by a different upstream source during a merge;
//! sections a source did not contribute stay at their empty defaults.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, non-empty product identifier.
///
/// Rows with an empty or whitespace-only code never make it into a
/// snapshot; construction rejects them up front.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCode(String);

impl ProductCode {
    /// Create a product code, rejecting empty or whitespace-only input.
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            None
        } else {
            Some(Self(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stock quantities per location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockLevels {
    /// Quantity in the ERP warehouse.
    pub erp: f64,
    /// Quantity as published by the eshop.
    pub eshop: f64,
    /// Quantity sitting in transport boxes.
    pub in_transport_boxes: f64,
}

/// Prices from both price sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceInfo {
    /// ERP list price.
    pub erp_price: Option<f64>,
    /// ERP purchase price.
    pub erp_purchase_price: Option<f64>,
    /// Eshop sale price, without VAT.
    pub eshop_price: Option<f64>,
    /// Eshop sale price, including VAT.
    pub eshop_price_with_vat: Option<f64>,
}

/// One day of invoiced sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesEntry {
    pub date: NaiveDate,
    pub quantity: f64,
    pub revenue: f64,
}

/// One goods-received line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseEntry {
    pub date: NaiveDate,
    pub quantity: f64,
    pub unit_cost: f64,
    pub supplier: Option<String>,
}

/// Material consumed by manufacturing on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionEntry {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One calculated manufacturing cost data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufactureCostEntry {
    pub date: NaiveDate,
    pub unit_cost: f64,
    pub batch_size: f64,
}

/// Manufacture template (recipe) summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufactureTemplate {
    pub template_name: String,
    pub batch_size: f64,
}

/// Manufacture difficulty setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufactureDifficulty {
    pub difficulty: f64,
    pub valid_from: Option<DateTime<Utc>>,
}

/// Lot-level inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotStock {
    pub lot: String,
    pub expires_on: Option<NaiveDate>,
    pub quantity: f64,
}

/// One stock-taking (physical count) event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTakingEntry {
    pub taken_at: DateTime<Utc>,
    pub counted_quantity: f64,
    pub expected_quantity: f64,
}

/// One open purchase-order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
    pub order_number: String,
    pub expected_on: Option<NaiveDate>,
    pub quantity: f64,
}

/// The merged, read-optimized product record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub code: ProductCode,
    pub name: Option<String>,
    pub stock: StockLevels,
    pub prices: PriceInfo,
    pub sales_history: Vec<SalesEntry>,
    pub purchase_history: Vec<PurchaseEntry>,
    pub consumption_history: Vec<ConsumptionEntry>,
    pub manufacture_cost_history: Vec<ManufactureCostEntry>,
    pub manufacture_template: Option<ManufactureTemplate>,
    pub manufacture_difficulty: Option<ManufactureDifficulty>,
    pub lots: Vec<LotStock>,
    pub stock_takings: Vec<StockTakingEntry>,
    pub open_purchase_orders: Vec<PurchaseOrderLine>,
}

impl ProductRecord {
    /// Create an empty record for the given code.
    pub fn new(code: ProductCode) -> Self {
        Self {
            code,
            name: None,
            stock: StockLevels::default(),
            prices: PriceInfo::default(),
            sales_history: Vec::new(),
            purchase_history: Vec::new(),
            consumption_history: Vec::new(),
            manufacture_cost_history: Vec::new(),
            manufacture_template: None,
            manufacture_difficulty: None,
            lots: Vec::new(),
            stock_takings: Vec::new(),
            open_purchase_orders: Vec::new(),
        }
    }

    /// Total quantity across all stock locations.
    pub fn total_stock(&self) -> f64 {
        self.stock.erp + self.stock.eshop + self.stock.in_transport_boxes
    }

    /// Whether any location holds a positive quantity.
    pub fn is_in_stock(&self) -> bool {
        self.total_stock() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_code_rejects_empty() {
        assert!(ProductCode::new("").is_none());
        assert!(ProductCode::new("   ").is_none());
        assert!(ProductCode::new("\t\n").is_none());
    }

    #[test]
    fn test_product_code_accepts_normal_codes() {
        let code = ProductCode::new("ABC123").unwrap();
        assert_eq!(code.as_str(), "ABC123");
        assert_eq!(format!("{}", code), "ABC123");
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = ProductRecord::new(ProductCode::new("X1").unwrap());
        assert!(record.name.is_none());
        assert!(record.sales_history.is_empty());
        assert!(record.lots.is_empty());
        assert_eq!(record.total_stock(), 0.0);
        assert!(!record.is_in_stock());
    }

    #[test]
    fn test_total_stock_sums_locations() {
        let mut record = ProductRecord::new(ProductCode::new("X1").unwrap());
        record.stock.erp = 3.0;
        record.stock.eshop = 2.0;
        record.stock.in_transport_boxes = 1.5;
        assert_eq!(record.total_stock(), 6.5);
        assert!(record.is_in_stock());
    }

    #[test]
    fn test_record_serializes_with_transparent_code() {
        let record = ProductRecord::new(ProductCode::new("SER-1").unwrap());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["code"], "SER-1");
    }
}
