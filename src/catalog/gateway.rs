//! Catalog gateway seam and the product-name resolution rule

use crate::error::{Result, VeganFlowError};
use async_trait::async_trait;

use super::types::{CatalogSnapshot, DealCommit, DealReceipt, Product};

/// Read/write access to the store's catalog.
///
/// Implementations must serialize `commit_deal` per product: two sessions
/// cannot both win a deal for the same shortage, and a retried commit from
/// the same session returns the original receipt.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Consistent view of products, vendors and offers
    async fn snapshot(&self) -> Result<CatalogSnapshot>;

    /// Record an accepted deal
    async fn commit_deal(&self, deal: DealCommit) -> Result<DealReceipt>;

    /// Deals committed so far
    async fn deals(&self) -> Result<Vec<DealReceipt>>;
}

/// Resolve a user-supplied product reference to exactly one product.
///
/// Resolution order:
/// 1. exact product ID (`P-OAT1`)
/// 2. exact name, case-insensitive
/// 3. the single product whose name contains the query, case-insensitive
///
/// Several substring matches yield `AmbiguousProduct`; none yields
/// `ProductNotFound`. The first matching row is never picked silently.
pub fn resolve_product<'a>(products: &'a [Product], query: &str) -> Result<&'a Product> {
    let needle = query.trim();
    if needle.is_empty() {
        return Err(VeganFlowError::ProductNotFound(query.to_string()));
    }

    if let Some(product) = products.iter().find(|p| p.product_id.0 == needle) {
        return Ok(product);
    }

    let lowered = needle.to_lowercase();
    if let Some(product) = products.iter().find(|p| p.name.to_lowercase() == lowered) {
        return Ok(product);
    }

    let mut matches: Vec<&Product> = products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&lowered))
        .collect();

    match matches.len() {
        0 => Err(VeganFlowError::ProductNotFound(query.to_string())),
        1 => Ok(matches.remove(0)),
        _ => {
            let mut candidates: Vec<String> = matches.iter().map(|p| p.name.clone()).collect();
            candidates.sort();
            Err(VeganFlowError::AmbiguousProduct {
                query: query.to_string(),
                candidates,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::demo_snapshot;
    use chrono::NaiveDate;

    fn products() -> Vec<Product> {
        let today = NaiveDate::from_ymd_opt(2025, 11, 1).unwrap();
        demo_snapshot(today, "http://localhost:8080").products
    }

    #[test]
    fn test_resolve_by_id() {
        let products = products();
        let product = resolve_product(&products, "P-BRIE").unwrap();
        assert_eq!(product.name, "Cultured Truffle Brie");
    }

    #[test]
    fn test_resolve_exact_name_case_insensitive() {
        let products = products();
        let product = resolve_product(&products, "oat barista blend").unwrap();
        assert_eq!(product.product_id.0, "P-OAT1");
    }

    #[test]
    fn test_resolve_unique_substring() {
        let products = products();
        let product = resolve_product(&products, "Shrimp").unwrap();
        assert_eq!(product.product_id.0, "P-FISH");
    }

    #[test]
    fn test_resolve_ambiguous_substring() {
        let products = products();
        // "Cultured Cashew Creamer" and "Cultured Truffle Brie"
        let err = resolve_product(&products, "cultured").unwrap_err();
        match err {
            VeganFlowError::AmbiguousProduct { candidates, .. } => {
                assert_eq!(
                    candidates,
                    vec![
                        "Cultured Cashew Creamer".to_string(),
                        "Cultured Truffle Brie".to_string()
                    ]
                );
            }
            other => panic!("expected AmbiguousProduct, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_missing() {
        let products = products();
        assert!(matches!(
            resolve_product(&products, "Dragonfruit"),
            Err(VeganFlowError::ProductNotFound(_))
        ));
        assert!(matches!(
            resolve_product(&products, "   "),
            Err(VeganFlowError::ProductNotFound(_))
        ));
    }
}
