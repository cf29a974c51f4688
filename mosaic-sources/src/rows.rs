//! Raw rows as delivered by the upstream sources.
//!
//! Every row pairs a raw product code with the payload that folds into the
//! matching section of a merged record. Payloads reuse the section entry
//! types from mosaic-core where one exists.

use chrono::{DateTime, NaiveDate, Utc};
use mosaic_core::{
    ConsumptionEntry, LotStock, ManufactureCostEntry, PurchaseEntry, PurchaseOrderLine, SalesEntry,
    StockTakingEntry,
};
use serde::{Deserialize, Serialize};

/// Catalog attribute row: the base record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRow {
    pub product_code: String,
    pub name: Option<String>,
}

/// One day of sales for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    pub product_code: String,
    #[serde(flatten)]
    pub entry: SalesEntry,
}

/// ERP warehouse quantity for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpStockRow {
    pub product_code: String,
    pub quantity: f64,
}

/// Eshop published quantity for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EshopStockRow {
    pub product_code: String,
    pub quantity: f64,
}

/// Consumed-material row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionRow {
    pub product_code: String,
    #[serde(flatten)]
    pub entry: ConsumptionEntry,
}

/// Goods-received row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRow {
    pub product_code: String,
    #[serde(flatten)]
    pub entry: PurchaseEntry,
}

/// Lot inventory row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotRow {
    pub product_code: String,
    #[serde(flatten)]
    pub lot: LotStock,
}

/// Eshop price row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EshopPriceRow {
    pub product_code: String,
    pub price: f64,
    pub price_with_vat: f64,
}

/// ERP price-list row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErpPriceRow {
    pub product_code: String,
    pub price: Option<f64>,
    pub purchase_price: Option<f64>,
}

/// Manufacture template row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRow {
    pub product_code: String,
    pub template_name: String,
    pub batch_size: f64,
}

/// Calculated manufacturing cost row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManufactureCostRow {
    pub product_code: String,
    #[serde(flatten)]
    pub entry: ManufactureCostEntry,
}

/// Manufacture difficulty row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRow {
    pub product_code: String,
    pub difficulty: f64,
    pub valid_from: Option<DateTime<Utc>>,
}

/// Quantity of one product held in transport boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportBoxRow {
    pub product_code: String,
    pub quantity: f64,
}

/// Stock-taking row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTakingRow {
    pub product_code: String,
    #[serde(flatten)]
    pub entry: StockTakingEntry,
}

/// Open purchase-order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderRow {
    pub product_code: String,
    #[serde(flatten)]
    pub line: PurchaseOrderLine,
}

impl SalesRow {
    pub fn new(product_code: impl Into<String>, date: NaiveDate, quantity: f64, revenue: f64) -> Self {
        Self {
            product_code: product_code.into(),
            entry: SalesEntry {
                date,
                quantity,
                revenue,
            },
        }
    }
}

impl AttributeRow {
    pub fn new(product_code: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            product_code: product_code.into(),
            name: name.map(|n| n.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_row_new() {
        let row = AttributeRow::new("A1", Some("Widget"));
        assert_eq!(row.product_code, "A1");
        assert_eq!(row.name.as_deref(), Some("Widget"));
    }

    #[test]
    fn test_sales_row_new() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let row = SalesRow::new("A1", date, 3.0, 450.0);
        assert_eq!(row.entry.date, date);
        assert_eq!(row.entry.quantity, 3.0);
        assert_eq!(row.entry.revenue, 450.0);
    }
}
