//! Named upstream sources.
//!
//! Every upstream collaborator that contributes a slice of the merged
//! product record is identified by a [`SourceKind`]. The invalidation
//! tracker, scheduler, and error types all refer to sources by this name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one upstream data source feeding the merged catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    /// Sales history (invoiced quantities and revenue per day).
    Sales,
    /// Catalog attributes (product names, base record set).
    CatalogAttributes,
    /// Physical stock quantities from the ERP warehouse.
    ErpStock,
    /// Stock quantities as published by the eshop.
    EshopStock,
    /// Materials consumed by manufacturing.
    ConsumedMaterials,
    /// Purchase (goods-received) history.
    PurchaseHistory,
    /// Lot-level inventory with expirations.
    Lots,
    /// Eshop sale prices.
    EshopPrices,
    /// ERP price list.
    ErpPrices,
    /// Manufacture templates (recipes).
    ManufactureTemplates,
    /// Calculated manufacturing cost history.
    ManufactureCost,
    /// Manufacture difficulty settings.
    ManufactureDifficulty,
    /// Stock sitting in transport boxes.
    TransportBoxes,
    /// Stock-taking (physical count) history.
    StockTakings,
    /// Open purchase-order lines.
    PurchaseOrders,
}

impl SourceKind {
    /// All known sources, in merge-fetch order.
    pub const ALL: [SourceKind; 15] = [
        SourceKind::CatalogAttributes,
        SourceKind::Sales,
        SourceKind::ErpStock,
        SourceKind::EshopStock,
        SourceKind::ConsumedMaterials,
        SourceKind::PurchaseHistory,
        SourceKind::Lots,
        SourceKind::EshopPrices,
        SourceKind::ErpPrices,
        SourceKind::ManufactureTemplates,
        SourceKind::ManufactureCost,
        SourceKind::ManufactureDifficulty,
        SourceKind::TransportBoxes,
        SourceKind::StockTakings,
        SourceKind::PurchaseOrders,
    ];

    /// Stable name used in logs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Sales => "Sales",
            SourceKind::CatalogAttributes => "CatalogAttributes",
            SourceKind::ErpStock => "ErpStock",
            SourceKind::EshopStock => "EshopStock",
            SourceKind::ConsumedMaterials => "ConsumedMaterials",
            SourceKind::PurchaseHistory => "PurchaseHistory",
            SourceKind::Lots => "Lots",
            SourceKind::EshopPrices => "EshopPrices",
            SourceKind::ErpPrices => "ErpPrices",
            SourceKind::ManufactureTemplates => "ManufactureTemplates",
            SourceKind::ManufactureCost => "ManufactureCost",
            SourceKind::ManufactureDifficulty => "ManufactureDifficulty",
            SourceKind::TransportBoxes => "TransportBoxes",
            SourceKind::StockTakings => "StockTakings",
            SourceKind::PurchaseOrders => "PurchaseOrders",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_sources_are_distinct() {
        let unique: HashSet<_> = SourceKind::ALL.iter().collect();
        assert_eq!(unique.len(), SourceKind::ALL.len());
    }

    #[test]
    fn test_display_matches_as_str() {
        for kind in SourceKind::ALL {
            assert_eq!(format!("{}", kind), kind.as_str());
        }
    }

    #[test]
    fn test_attributes_fetched_first() {
        // The base record set comes from attributes; keep it first.
        assert_eq!(SourceKind::ALL[0], SourceKind::CatalogAttributes);
    }
}
