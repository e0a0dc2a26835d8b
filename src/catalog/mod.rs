//! Catalog gateway: product, vendor and offer records plus deal commits

pub mod gateway;
pub mod memory;
pub mod query;
pub mod types;

pub use gateway::{resolve_product, CatalogGateway};
pub use memory::InMemoryCatalog;
pub use query::{run_query, CatalogQuery, CatalogReport, DetailedOffer, ProductDetail, ProductSummary};
pub use types::{
    CatalogSnapshot, DealCommit, DealReceipt, PriceGuard, Product, Vendor, VendorKind, VendorOffer,
};
