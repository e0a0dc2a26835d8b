//! VeganFlow Procurement Negotiation Engine
//!
//! Detects inventory that will run out or spoil, ranks the vendors offering
//! each product, and negotiates with them over HTTP, falling back to the
//! next vendor when one declines or cannot be reached:
//! - Inventory risk scanning (low stock, expiring batches)
//! - Vendor ranking by wholesale price
//! - Round-based negotiation with fallback and deal commits
//! - Vendor-side pricing server and buyer-side client

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod inventory;
pub mod negotiation;
pub mod seed;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogGateway, CatalogSnapshot, InMemoryCatalog};
pub use config::AppConfig;
pub use error::{Result, VeganFlowError};
pub use inventory::{RiskReport, RiskScanner};
pub use negotiation::{NegotiationCoordinator, NegotiationOutcome, NegotiationReport, VendorRanker};
pub use transport::{HttpVendorClient, VendorProfile, VendorTransport};
pub use types::{ProductID, SessionID, VendorID};
