//! Catalog read queries: risk reports, product detail and full listing

use crate::error::{Result, VeganFlowError};
use crate::inventory::{ExpiringItem, LowStockItem, RiskScanner};
use crate::negotiation::ranker::VendorRanker;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::gateway::CatalogGateway;
use super::types::{Product, VendorOffer};

/// Query kinds accepted by [`run_query`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogQuery {
    LowStock,
    ExpiringSoon,
    ProductDetail { product_name: String },
    All,
}

impl CatalogQuery {
    /// Build a query from its wire name and optional product name
    pub fn parse(query_type: &str, product_name: Option<&str>) -> Result<Self> {
        match query_type.trim().to_uppercase().as_str() {
            "LOW_STOCK" => Ok(CatalogQuery::LowStock),
            "EXPIRING_SOON" => Ok(CatalogQuery::ExpiringSoon),
            "ALL" => Ok(CatalogQuery::All),
            "PRODUCT_DETAIL" => match product_name {
                Some(name) if !name.trim().is_empty() => Ok(CatalogQuery::ProductDetail {
                    product_name: name.to_string(),
                }),
                _ => Err(VeganFlowError::InvalidQuery(
                    "PRODUCT_DETAIL requires a product name".to_string(),
                )),
            },
            other => Err(VeganFlowError::InvalidQuery(format!(
                "unknown query type '{other}'"
            ))),
        }
    }
}

impl FromStr for CatalogQuery {
    type Err = VeganFlowError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, None)
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogQuery::LowStock => write!(f, "LOW_STOCK"),
            CatalogQuery::ExpiringSoon => write!(f, "EXPIRING_SOON"),
            CatalogQuery::ProductDetail { .. } => write!(f, "PRODUCT_DETAIL"),
            CatalogQuery::All => write!(f, "ALL"),
        }
    }
}

/// One competing offer in a detail report
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailedOffer {
    pub vendor_name: String,
    pub reliability_score: Decimal,
    pub endpoint: String,
    #[serde(flatten)]
    pub offer: VendorOffer,
}

/// A product with its ranked offers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    pub offers: Vec<DetailedOffer>,
}

/// A row of the full listing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product: Product,
    pub nearest_expiry: Option<NaiveDate>,
    pub offers: Vec<VendorOffer>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query_type", content = "results", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogReport {
    LowStock(Vec<LowStockItem>),
    ExpiringSoon(Vec<ExpiringItem>),
    ProductDetail(ProductDetail),
    All(Vec<ProductSummary>),
}

/// Run a read query against the gateway's current snapshot
pub async fn run_query(
    gateway: &dyn CatalogGateway,
    query: &CatalogQuery,
    today: NaiveDate,
) -> Result<CatalogReport> {
    let snapshot = gateway.snapshot().await?;
    let scanner = RiskScanner::new();

    tracing::debug!("Running catalog query {}", query);

    match query {
        CatalogQuery::LowStock => {
            let report = scanner.scan(&snapshot.products, &snapshot.offers, today)?;
            Ok(CatalogReport::LowStock(report.low_stock))
        }
        CatalogQuery::ExpiringSoon => {
            let report = scanner.scan(&snapshot.products, &snapshot.offers, today)?;
            Ok(CatalogReport::ExpiringSoon(report.expiring_soon))
        }
        CatalogQuery::ProductDetail { product_name } => {
            let ranking = VendorRanker::new().rank(&snapshot, product_name)?;
            let offers = ranking
                .candidates(&snapshot)
                .into_iter()
                .map(|c| DetailedOffer {
                    vendor_name: c.vendor.name,
                    reliability_score: c.vendor.reliability_score,
                    endpoint: c.vendor.endpoint,
                    offer: c.offer,
                })
                .collect();
            Ok(CatalogReport::ProductDetail(ProductDetail {
                product: ranking.product,
                offers,
            }))
        }
        CatalogQuery::All => {
            let mut products = snapshot.products.clone();
            products.sort_by(|a, b| a.product_id.cmp(&b.product_id));

            let rows = products
                .into_iter()
                .map(|product| {
                    let nearest_expiry =
                        RiskScanner::nearest_expiry(&product.product_id, &snapshot.offers);
                    let offers = snapshot.offers_for(&product.product_id);
                    ProductSummary {
                        product,
                        nearest_expiry,
                        offers,
                    }
                })
                .collect();
            Ok(CatalogReport::All(rows))
        }
    }
}
