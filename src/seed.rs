//! Demo store: the product catalog, supplier directory and competing offers
//! used by the CLI and the vendor hub.

use crate::catalog::{CatalogSnapshot, PriceGuard, Product, Vendor, VendorKind, VendorOffer};
use crate::error::Result;
use crate::transport::{PriceTable, VendorProfile};
use crate::types::{ProductID, VendorID};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

/// A vendor in the demo directory
#[derive(Clone, Copy, Debug)]
pub struct DemoVendor {
    pub vendor_id: &'static str,
    pub slug: &'static str,
    pub name: &'static str,
    pub kind: VendorKind,
    /// Reliability in hundredths (88 = 0.88)
    pub reliability_pct: i64,
}

impl DemoVendor {
    pub fn reliability(&self) -> Decimal {
        Decimal::new(self.reliability_pct, 2)
    }

    /// Endpoint of this vendor when mounted on a hub at `hub_url`
    pub fn endpoint(&self, hub_url: &str) -> String {
        format!("{}/{}", hub_url.trim_end_matches('/'), self.slug)
    }

    /// Server-side pricing profile using the shared market table
    pub fn profile(&self) -> Result<VendorProfile> {
        VendorProfile::new(
            self.slug,
            self.name,
            self.reliability(),
            PriceTable::market_default(),
        )
    }
}

/// Pricing profiles for every demo vendor, in directory order
pub fn demo_profiles() -> Result<Vec<VendorProfile>> {
    DEMO_VENDORS.iter().map(DemoVendor::profile).collect()
}

pub const DEMO_VENDORS: [DemoVendor; 11] = [
    DemoVendor { vendor_id: "V-01", slug: "earthly", name: "Earthly Gourmet", kind: VendorKind::Distributor, reliability_pct: 98 },
    DemoVendor { vendor_id: "V-02", slug: "feesers", name: "Feesers Food Dst", kind: VendorKind::Distributor, reliability_pct: 92 },
    DemoVendor { vendor_id: "V-03", slug: "clark", name: "Clark Distributing", kind: VendorKind::Distributor, reliability_pct: 88 },
    DemoVendor { vendor_id: "V-04", slug: "lcg", name: "LCG Foods", kind: VendorKind::Distributor, reliability_pct: 95 },
    DemoVendor { vendor_id: "V-05", slug: "miyokos", name: "Miyokos Creamery", kind: VendorKind::Maker, reliability_pct: 99 },
    DemoVendor { vendor_id: "V-06", slug: "rebel", name: "Rebel Cheese", kind: VendorKind::Maker, reliability_pct: 96 },
    DemoVendor { vendor_id: "V-07", slug: "treeline", name: "Treeline Cheese", kind: VendorKind::Maker, reliability_pct: 94 },
    DemoVendor { vendor_id: "V-08", slug: "vreamery", name: "The Vreamery", kind: VendorKind::Aggregator, reliability_pct: 97 },
    DemoVendor { vendor_id: "V-09", slug: "behive", name: "The BE Hive", kind: VendorKind::Specialist, reliability_pct: 93 },
    DemoVendor { vendor_id: "V-10", slug: "allveg", name: "All Vegetarian Inc", kind: VendorKind::Specialist, reliability_pct: 85 },
    DemoVendor { vendor_id: "V-11", slug: "fakemeats", name: "FakeMeats.com", kind: VendorKind::Aggregator, reliability_pct: 99 },
];

// (id, name, category, stock, velocity/day, target, primary vendor)
const PRODUCTS: [(&str, &str, &str, u32, f64, u32, &str); 21] = [
    ("P-OAT1", "Oat Barista Blend", "Beverage", 12, 15.0, 100, "V-01"),
    ("P-OAT2", "Almond Milk Unsweet", "Beverage", 45, 5.0, 50, "V-04"),
    ("P-DAI", "Soy Yogurt (Plain)", "Dairy-Alt", 30, 3.0, 40, "V-02"),
    ("P-CREAM", "Cultured Cashew Creamer", "Dairy-Alt", 15, 2.0, 30, "V-05"),
    ("P-BRIE", "Cultured Truffle Brie", "Cheese", 8, 2.0, 20, "V-06"),
    ("P-CHED", "Aged Pepper Jack Block", "Cheese", 35, 4.0, 50, "V-05"),
    ("P-SMOK", "Smoked Gouda Style Wheel", "Cheese", 15, 1.0, 30, "V-07"),
    ("P-KALE", "Local Organic Kale", "Produce", 5, 1.0, 10, "V-08"),
    ("P-TEM", "Artisanal Tempeh Batch", "Produce", 10, 2.0, 20, "V-09"),
    ("P-FERM", "Kimchi - Small Batch", "Produce", 25, 3.0, 30, "V-08"),
    ("P-PEP", "Seitan Pepperoni (Bulk)", "Deli", 40, 8.0, 100, "V-09"),
    ("P-SAUS", "Beyond Sausage Links", "Deli", 80, 10.0, 150, "V-02"),
    ("P-BEHI", "Chorizo Seitan", "Deli", 50, 5.0, 75, "V-09"),
    ("P-FISH", "Vegan Jumbo Shrimp", "Frozen", 5, 1.0, 20, "V-10"),
    ("P-PIZ", "Frozen Margherita Pizza", "Frozen", 120, 15.0, 200, "V-04"),
    ("P-MAC", "Frozen Mac & Cheese", "Frozen", 90, 10.0, 150, "V-02"),
    ("P-FAL", "Falafel Mix Dry", "Pantry", 30, 5.0, 50, "V-03"),
    ("P-MAY", "Vegan Mayo Large", "Pantry", 25, 2.0, 50, "V-01"),
    ("P-TUNA", "Plant-Based Tuna Cans", "Pantry", 150, 10.0, 300, "V-04"),
    ("P-COOK", "Gluten-Free Cookies", "Pantry", 50, 4.0, 80, "V-11"),
    ("P-SLAW", "Ready-Mix Coleslaw", "Produce", 25, 5.0, 40, "V-08"),
];

// (product, vendor, price in cents, MOQ, delivery days, clearance batch)
const OFFERS: [(&str, &str, i64, u32, u32, bool); 16] = [
    ("P-OAT1", "V-01", 350, 12, 2, false),
    ("P-OAT1", "V-03", 325, 50, 5, false),
    ("P-OAT1", "V-04", 380, 6, 1, false),
    ("P-BRIE", "V-06", 950, 10, 4, false),
    ("P-BRIE", "V-08", 1100, 1, 2, false),
    ("P-SMOK", "V-07", 890, 15, 3, false),
    ("P-PEP", "V-09", 1200, 5, 3, false),
    ("P-PEP", "V-11", 850, 20, 2, true),
    ("P-FISH", "V-10", 1400, 10, 7, false),
    ("P-FISH", "V-02", 1450, 20, 3, false),
    ("P-TUNA", "V-04", 550, 50, 2, false),
    ("P-TUNA", "V-03", 530, 100, 4, false),
    ("P-COOK", "V-11", 410, 20, 1, false),
    ("P-MAC", "V-02", 790, 50, 3, false),
    ("P-PIZ", "V-04", 920, 10, 1, false),
    ("P-SLAW", "V-08", 350, 5, 2, false),
];

// (product, target price in cents, ceiling in cents)
const PRICE_GUARDS: [(&str, i64, i64); 1] = [("P-OAT1", 340, 360)];

const FRESH_BATCH_DAYS: i64 = 120;
const CLEARANCE_BATCH_DAYS: i64 = 15;

/// Build the demo catalog relative to `today`, with every vendor mounted on
/// the hub at `hub_url`.
pub fn demo_snapshot(today: NaiveDate, hub_url: &str) -> CatalogSnapshot {
    let vendors = DEMO_VENDORS
        .iter()
        .map(|v| Vendor {
            vendor_id: VendorID(v.vendor_id.to_string()),
            name: v.name.to_string(),
            kind: v.kind,
            reliability_score: v.reliability(),
            endpoint: v.endpoint(hub_url),
        })
        .collect();

    let products = PRODUCTS
        .iter()
        .map(|&(id, name, category, stock, velocity, target, vendor)| Product {
            product_id: ProductID(id.to_string()),
            name: name.to_string(),
            category: category.to_string(),
            stock_quantity: stock,
            sales_velocity_daily: velocity,
            target_stock_level: target,
            vendor_id: VendorID(vendor.to_string()),
        })
        .collect();

    let fresh = today + Duration::days(FRESH_BATCH_DAYS);
    let clearance = today + Duration::days(CLEARANCE_BATCH_DAYS);

    let offers = OFFERS
        .iter()
        .map(|&(product, vendor, cents, moq, days, is_clearance)| VendorOffer {
            product_id: ProductID(product.to_string()),
            vendor_id: VendorID(vendor.to_string()),
            price_wholesale: Decimal::new(cents, 2),
            min_order_qty: moq,
            delivery_days: days,
            batch_expiry_date: Some(if is_clearance { clearance } else { fresh }),
        })
        .collect();

    let price_guards = PRICE_GUARDS
        .iter()
        .map(|&(product, target, max)| PriceGuard {
            product_id: ProductID(product.to_string()),
            target_price: Decimal::new(target, 2),
            max_price: Decimal::new(max, 2),
        })
        .collect();

    CatalogSnapshot {
        products,
        vendors,
        offers,
        price_guards,
    }
}
