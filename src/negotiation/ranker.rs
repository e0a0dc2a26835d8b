//! Vendor ranking: cheapest list price first

use crate::catalog::{resolve_product, CatalogSnapshot, Product, Vendor, VendorOffer};
use crate::error::Result;
use crate::types::ProductID;

/// Sort a product's offers ascending by wholesale price, ties broken by
/// vendor ID so the order is stable across calls.
pub fn rank_offers(product_id: &ProductID, offers: &[VendorOffer]) -> Vec<VendorOffer> {
    let mut ranked: Vec<VendorOffer> = offers
        .iter()
        .filter(|o| &o.product_id == product_id)
        .cloned()
        .collect();

    ranked.sort_by(|a, b| {
        a.price_wholesale
            .cmp(&b.price_wholesale)
            .then_with(|| a.vendor_id.cmp(&b.vendor_id))
    });

    ranked
}

/// A ranked offer together with the vendor that made it
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub offer: VendorOffer,
    pub vendor: Vendor,
}

/// Ranked market for one product
#[derive(Clone, Debug)]
pub struct Ranking {
    pub product: Product,
    pub offers: Vec<VendorOffer>,
}

impl Ranking {
    /// Join the ranked offers with their vendors.
    ///
    /// Offers pointing at a vendor missing from the directory are dropped.
    pub fn candidates(&self, snapshot: &CatalogSnapshot) -> Vec<Candidate> {
        self.offers
            .iter()
            .filter_map(|offer| match snapshot.vendor(&offer.vendor_id) {
                Some(vendor) => Some(Candidate {
                    offer: offer.clone(),
                    vendor: vendor.clone(),
                }),
                None => {
                    tracing::warn!(
                        "Skipping offer for {} from unknown vendor {}",
                        offer.product_id,
                        offer.vendor_id
                    );
                    None
                }
            })
            .collect()
    }
}

/// Resolves a product reference and ranks its offers
#[derive(Clone, Debug, Default)]
pub struct VendorRanker;

impl VendorRanker {
    pub fn new() -> Self {
        Self
    }

    /// Rank offers for the product matching `product_name`.
    ///
    /// Fails with `ProductNotFound` / `AmbiguousProduct` per
    /// [`resolve_product`]; a product with no offers ranks to an empty list.
    pub fn rank(&self, snapshot: &CatalogSnapshot, product_name: &str) -> Result<Ranking> {
        let product = resolve_product(&snapshot.products, product_name)?.clone();
        let offers = rank_offers(&product.product_id, &snapshot.offers);

        tracing::debug!(
            "Ranked {} offers for {} ({})",
            offers.len(),
            product.name,
            product.product_id
        );

        Ok(Ranking { product, offers })
    }
}
