//! Mosaic Core - Domain Types for the Product Catalog Cache
//!
//! Defines the data model shared across the Mosaic workspace: product
//! records and their per-source sections, immutable snapshots, the named
//! upstream sources, the injected clock, configuration, and the error
//! hierarchy. The cache/merge machinery itself lives in mosaic-catalog.

pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod product;
pub mod snapshot;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CatalogCacheOptions, DataSourceOptions};
pub use error::{CatalogError, CatalogResult, ConfigError, SourceError};
pub use filter::{Page, PageRequest, ProductFilter, MAX_PAGE_SIZE};
pub use product::{
    ConsumptionEntry, LotStock, ManufactureCostEntry, ManufactureDifficulty, ManufactureTemplate,
    PriceInfo, ProductCode, ProductRecord, PurchaseEntry, PurchaseOrderLine, SalesEntry,
    StockLevels, StockTakingEntry,
};
pub use snapshot::Snapshot;
pub use source::SourceKind;
