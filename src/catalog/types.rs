//! Catalog records: products, vendors, offers and committed deals

use crate::error::{Result, VeganFlowError};
use crate::types::{ProductID, SessionID, VendorID};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A product carried by the store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductID,
    pub name: String,
    pub category: String,
    pub stock_quantity: u32,
    pub sales_velocity_daily: f64,
    pub target_stock_level: u32,
    /// Primary vendor
    pub vendor_id: VendorID,
}

impl Product {
    /// Days until stockout at the current sale rate.
    ///
    /// Zero, negative or non-finite velocity is rejected instead of producing
    /// an infinite supply.
    pub fn days_of_supply(&self) -> Result<f64> {
        let velocity = self.sales_velocity_daily;
        if !velocity.is_finite() || velocity <= 0.0 {
            return Err(VeganFlowError::InvalidVelocity {
                product_id: self.product_id.0.clone(),
                velocity,
            });
        }
        Ok(self.stock_quantity as f64 / velocity)
    }

    /// Units needed to bring stock back up to target
    pub fn reorder_quantity(&self) -> u32 {
        self.target_stock_level.saturating_sub(self.stock_quantity)
    }
}

/// Vendor category from the supplier directory
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorKind {
    Distributor,
    Maker,
    Aggregator,
    Specialist,
}

/// A supplier reachable over the negotiation transport
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: VendorID,
    pub name: String,
    pub kind: VendorKind,
    /// Opaque trust signal in [0, 1]; only the vendor's own pricing uses it.
    pub reliability_score: Decimal,
    /// Base URL of the vendor's negotiation endpoint
    pub endpoint: String,
}

/// A competing offer for one product from one vendor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorOffer {
    pub product_id: ProductID,
    pub vendor_id: VendorID,
    pub price_wholesale: Decimal,
    pub min_order_qty: u32,
    pub delivery_days: u32,
    pub batch_expiry_date: Option<NaiveDate>,
}

/// Buyer's standing price goal for a product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceGuard {
    pub product_id: ProductID,
    /// Price the buyer hopes to land at or under
    pub target_price: Decimal,
    /// Hard ceiling: nothing above it is offered or re-offered
    pub max_price: Decimal,
}

impl PriceGuard {
    pub fn allows(&self, price: Decimal) -> bool {
        price <= self.max_price
    }

    pub fn meets_target(&self, price: Decimal) -> bool {
        price <= self.target_price
    }
}

/// Point-in-time view of the catalog
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    pub vendors: Vec<Vendor>,
    pub offers: Vec<VendorOffer>,
    #[serde(default)]
    pub price_guards: Vec<PriceGuard>,
}

impl CatalogSnapshot {
    /// Load a snapshot from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&raw)?;
        Ok(snapshot)
    }

    pub fn product(&self, product_id: &ProductID) -> Option<&Product> {
        self.products.iter().find(|p| &p.product_id == product_id)
    }

    pub fn vendor(&self, vendor_id: &VendorID) -> Option<&Vendor> {
        self.vendors.iter().find(|v| &v.vendor_id == vendor_id)
    }

    pub fn price_guard(&self, product_id: &ProductID) -> Option<&PriceGuard> {
        self.price_guards.iter().find(|g| &g.product_id == product_id)
    }

    /// All offers for a product, in storage order
    pub fn offers_for(&self, product_id: &ProductID) -> Vec<VendorOffer> {
        self.offers
            .iter()
            .filter(|o| &o.product_id == product_id)
            .cloned()
            .collect()
    }
}

/// Write request for an accepted deal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealCommit {
    pub session_id: SessionID,
    pub product_id: ProductID,
    pub vendor_id: VendorID,
    pub price: Decimal,
    pub quantity: u32,
    pub delivery_days: u32,
}

/// Acknowledgement of a committed deal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DealReceipt {
    pub deal: DealCommit,
    pub committed_at: DateTime<Utc>,
    /// True when this receipt answers a retried commit of an existing deal
    pub replayed: bool,
}
