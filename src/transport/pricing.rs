//! Vendor-side offer evaluation
//!
//! Every vendor prices from a private market table scaled by its own
//! reliability score. Evaluation is a pure function of the offer and the
//! vendor profile; nothing carries over between calls.

use crate::error::{Result, VeganFlowError};
use crate::types::round_cents;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::message::{NegotiationResult, OfferRequest};

/// Orders above this many units get the bulk discount
pub const BULK_THRESHOLD: u32 = 50;

/// Floor multiplier for bulk orders (5% off)
pub fn bulk_discount() -> Decimal {
    Decimal::new(95, 2)
}

/// Counter-offers are quoted this far above the floor (5%)
pub fn counter_markup() -> Decimal {
    Decimal::new(105, 2)
}

/// Private base-price table
#[derive(Clone, Debug)]
pub struct PriceTable {
    entries: Vec<(String, Decimal)>,
    default_price: Decimal,
}

impl PriceTable {
    pub fn new(default_price: Decimal) -> Self {
        Self {
            entries: Vec::new(),
            default_price,
        }
    }

    pub fn with_price(mut self, product: impl Into<String>, price: Decimal) -> Self {
        self.entries.push((product.into(), price));
        self
    }

    /// Market prices shared by the demo vendors
    pub fn market_default() -> Self {
        Self::new(Decimal::new(1000, 2))
            .with_price("Oat Barista Blend", Decimal::new(350, 2))
            .with_price("Cultured Truffle Brie", Decimal::new(1000, 2))
            .with_price("Seitan Pepperoni", Decimal::new(1200, 2))
            .with_price("Vegan Jumbo Shrimp", Decimal::new(1400, 2))
            .with_price("Texas BBQ Soy Jerky", Decimal::new(500, 2))
    }

    /// Base price for a requested product: the first entry whose key occurs
    /// in the product name, else the default.
    pub fn base_price(&self, product: &str) -> Decimal {
        self.entries
            .iter()
            .find(|(key, _)| product.contains(key.as_str()))
            .map(|(_, price)| *price)
            .unwrap_or(self.default_price)
    }
}

/// A vendor's identity and pricing rule
#[derive(Clone, Debug)]
pub struct VendorProfile {
    slug: String,
    name: String,
    reliability: Decimal,
    prices: PriceTable,
}

impl VendorProfile {
    /// Create a profile; reliability must lie in (0, 1].
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        reliability: Decimal,
        prices: PriceTable,
    ) -> Result<Self> {
        let name = name.into();
        if reliability <= Decimal::ZERO || reliability > Decimal::ONE {
            return Err(VeganFlowError::InvalidVendor(format!(
                "{name}: reliability {reliability} outside (0, 1]"
            )));
        }

        Ok(Self {
            slug: slug.into(),
            name,
            reliability,
            prices,
        })
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reliability(&self) -> Decimal {
        self.reliability
    }

    /// Minimum acceptable unit price for `quantity` units of `product`
    pub fn floor_price(&self, product: &str, quantity: u32) -> Decimal {
        let mut floor = self.prices.base_price(product) * self.reliability;
        if quantity > BULK_THRESHOLD {
            floor *= bulk_discount();
        }
        floor
    }

    /// Promised delivery window: ceil(2 / reliability) days
    pub fn delivery_days(&self) -> u32 {
        (Decimal::from(2) / self.reliability)
            .ceil()
            .to_u32()
            .unwrap_or(u32::MAX)
    }

    /// Decide on an incoming offer
    pub fn evaluate(&self, offer: &OfferRequest) -> NegotiationResult {
        if offer.quantity == 0 {
            return NegotiationResult::rejected("Quantity must be at least one unit.");
        }
        if offer.offer_price <= Decimal::ZERO {
            return NegotiationResult::rejected("Offer price must be positive.");
        }

        let floor = self.floor_price(&offer.product, offer.quantity);

        if offer.offer_price >= floor {
            let days = self.delivery_days();
            return NegotiationResult::accepted(
                offer.offer_price,
                days,
                format!(
                    "We can supply {} units of {} at ${}. Delivery in {} days.",
                    offer.quantity, offer.product, offer.offer_price, days
                ),
            );
        }

        let counter = round_cents(floor * counter_markup());
        NegotiationResult::counter(
            counter,
            format!("Price too low. The lowest we can go is ${counter}."),
        )
    }
}
