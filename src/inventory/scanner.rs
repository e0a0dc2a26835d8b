//! Stockout and spoilage risk detection

use crate::catalog::{Product, VendorOffer};
use crate::error::Result;
use crate::types::{ProductID, VendorID};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days of supply below which a product is flagged
pub const LOW_STOCK_DAYS: f64 = 3.0;

/// Batches expiring before `today + EXPIRY_WINDOW_DAYS` are flagged
pub const EXPIRY_WINDOW_DAYS: i64 = 7;

/// Risk classification of a single product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskClass {
    LowStock,
    ExpiringSoon,
    Ok,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub product_id: ProductID,
    pub name: String,
    pub stock_quantity: u32,
    pub sales_velocity_daily: f64,
    /// Rounded to one decimal
    pub days_of_supply: f64,
    pub vendor_id: VendorID,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpiringItem {
    pub product_id: ProductID,
    pub name: String,
    pub stock_quantity: u32,
    pub nearest_expiry: NaiveDate,
    /// Negative when the batch has already expired
    pub days_until_expiry: i64,
}

/// Output of a full scan: two disjoint lists, each sorted by product ID
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub low_stock: Vec<LowStockItem>,
    pub expiring_soon: Vec<ExpiringItem>,
}

/// Classifies products by days of supply and nearest batch expiry.
///
/// A product that is both short and expiring is reported as low stock only.
#[derive(Clone, Debug)]
pub struct RiskScanner {
    low_stock_days: f64,
    expiry_window_days: i64,
}

impl Default for RiskScanner {
    fn default() -> Self {
        Self {
            low_stock_days: LOW_STOCK_DAYS,
            expiry_window_days: EXPIRY_WINDOW_DAYS,
        }
    }
}

impl RiskScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_low_stock_days(mut self, days: f64) -> Self {
        self.low_stock_days = days;
        self
    }

    pub fn with_expiry_window_days(mut self, days: i64) -> Self {
        self.expiry_window_days = days;
        self
    }

    /// Earliest batch expiry among a product's offers, if any offer has one
    pub fn nearest_expiry(product_id: &ProductID, offers: &[VendorOffer]) -> Option<NaiveDate> {
        offers
            .iter()
            .filter(|o| &o.product_id == product_id)
            .filter_map(|o| o.batch_expiry_date)
            .min()
    }

    fn expires_soon(&self, expiry: NaiveDate, today: NaiveDate) -> bool {
        expiry < today + Duration::days(self.expiry_window_days)
    }

    /// Classify one product
    pub fn classify(
        &self,
        product: &Product,
        offers: &[VendorOffer],
        today: NaiveDate,
    ) -> Result<RiskClass> {
        if product.days_of_supply()? < self.low_stock_days {
            return Ok(RiskClass::LowStock);
        }

        match Self::nearest_expiry(&product.product_id, offers) {
            Some(expiry) if self.expires_soon(expiry, today) => Ok(RiskClass::ExpiringSoon),
            _ => Ok(RiskClass::Ok),
        }
    }

    /// Scan the whole product set.
    ///
    /// Fails on the first product with an invalid sales velocity.
    pub fn scan(
        &self,
        products: &[Product],
        offers: &[VendorOffer],
        today: NaiveDate,
    ) -> Result<RiskReport> {
        let mut sorted: Vec<&Product> = products.iter().collect();
        sorted.sort_by(|a, b| a.product_id.cmp(&b.product_id));

        let mut report = RiskReport::default();

        for product in sorted {
            match self.classify(product, offers, today)? {
                RiskClass::LowStock => {
                    let days = product.days_of_supply()?;
                    report.low_stock.push(LowStockItem {
                        product_id: product.product_id.clone(),
                        name: product.name.clone(),
                        stock_quantity: product.stock_quantity,
                        sales_velocity_daily: product.sales_velocity_daily,
                        days_of_supply: (days * 10.0).round() / 10.0,
                        vendor_id: product.vendor_id.clone(),
                    });
                }
                RiskClass::ExpiringSoon => {
                    let Some(expiry) = Self::nearest_expiry(&product.product_id, offers) else {
                        continue;
                    };
                    report.expiring_soon.push(ExpiringItem {
                        product_id: product.product_id.clone(),
                        name: product.name.clone(),
                        stock_quantity: product.stock_quantity,
                        nearest_expiry: expiry,
                        days_until_expiry: (expiry - today).num_days(),
                    });
                }
                RiskClass::Ok => {}
            }
        }

        tracing::debug!(
            "Risk scan: {} low stock, {} expiring soon out of {} products",
            report.low_stock.len(),
            report.expiring_soon.len(),
            products.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VeganFlowError;
    use crate::seed::demo_snapshot;
    use rust_decimal::Decimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
    }

    fn product(id: &str, stock: u32, velocity: f64) -> Product {
        Product {
            product_id: ProductID(id.to_string()),
            name: format!("Product {id}"),
            category: "Test".to_string(),
            stock_quantity: stock,
            sales_velocity_daily: velocity,
            target_stock_level: 100,
            vendor_id: VendorID("V-01".to_string()),
        }
    }

    fn offer(product_id: &str, expiry: Option<NaiveDate>) -> VendorOffer {
        VendorOffer {
            product_id: ProductID(product_id.to_string()),
            vendor_id: VendorID("V-01".to_string()),
            price_wholesale: Decimal::new(500, 2),
            min_order_qty: 1,
            delivery_days: 2,
            batch_expiry_date: expiry,
        }
    }

    #[test]
    fn test_low_stock_threshold() {
        let scanner = RiskScanner::new();
        // 9 / 3 = 3.0 days: not low
        let at_threshold = product("P-A", 9, 3.0);
        // 8 / 3 = 2.67 days: low
        let below = product("P-B", 8, 3.0);

        assert_eq!(
            scanner.classify(&at_threshold, &[], today()).unwrap(),
            RiskClass::Ok
        );
        assert_eq!(
            scanner.classify(&below, &[], today()).unwrap(),
            RiskClass::LowStock
        );
    }

    #[test]
    fn test_days_of_supply_rounded_in_report() {
        let scanner = RiskScanner::new();
        let report = scanner
            .scan(&[product("P-OAT1", 12, 15.0)], &[], today())
            .unwrap();

        assert_eq!(report.low_stock.len(), 1);
        assert_eq!(report.low_stock[0].days_of_supply, 0.8);
        assert_eq!(report.low_stock[0].vendor_id.0, "V-01");
    }

    #[test]
    fn test_zero_velocity_fails_scan() {
        let scanner = RiskScanner::new();
        let result = scanner.scan(
            &[product("P-A", 10, 2.0), product("P-B", 10, 0.0)],
            &[],
            today(),
        );
        assert!(matches!(
            result,
            Err(VeganFlowError::InvalidVelocity { .. })
        ));
    }

    #[test]
    fn test_expiring_window_uses_nearest_batch() {
        let scanner = RiskScanner::new();
        let products = vec![product("P-A", 100, 1.0)];
        let offers = vec![
            offer("P-A", Some(today() + Duration::days(60))),
            offer("P-A", Some(today() + Duration::days(6))),
        ];

        let report = scanner.scan(&products, &offers, today()).unwrap();
        assert_eq!(report.expiring_soon.len(), 1);
        assert_eq!(report.expiring_soon[0].days_until_expiry, 6);
    }

    #[test]
    fn test_expiry_window_boundary() {
        let scanner = RiskScanner::new();
        let products = vec![product("P-A", 100, 1.0)];
        let on_boundary = vec![offer("P-A", Some(today() + Duration::days(7)))];
        let expired = vec![offer("P-A", Some(today() - Duration::days(1)))];

        let report = scanner.scan(&products, &on_boundary, today()).unwrap();
        assert!(report.expiring_soon.is_empty());

        let report = scanner.scan(&products, &expired, today()).unwrap();
        assert_eq!(report.expiring_soon.len(), 1);
        assert_eq!(report.expiring_soon[0].days_until_expiry, -1);
    }

    #[test]
    fn test_products_without_offers_are_not_expiring() {
        let scanner = RiskScanner::new();
        let products = vec![product("P-A", 100, 1.0)];
        let offers = vec![offer("P-A", None)];

        let report = scanner.scan(&products, &offers, today()).unwrap();
        assert!(report.expiring_soon.is_empty());
        assert!(report.low_stock.is_empty());
    }

    #[test]
    fn test_reports_are_disjoint_and_sorted() {
        let scanner = RiskScanner::new();
        let products = vec![product("P-C", 1, 1.0), product("P-A", 2, 1.0)];
        let offers = vec![offer("P-C", Some(today()))];

        let report = scanner.scan(&products, &offers, today()).unwrap();
        let ids: Vec<&str> = report.low_stock.iter().map(|i| i.product_id.0.as_str()).collect();
        assert_eq!(ids, vec!["P-A", "P-C"]);
        assert!(report.expiring_soon.is_empty());
    }

    #[test]
    fn test_demo_store_scan() {
        let snapshot = demo_snapshot(today(), "http://localhost:8080");
        let report = RiskScanner::new()
            .scan(&snapshot.products, &snapshot.offers, today())
            .unwrap();

        let low: Vec<&str> = report.low_stock.iter().map(|i| i.product_id.0.as_str()).collect();
        assert_eq!(low, vec!["P-OAT1"]);

        // The pepperoni clearance batch expires in 15 days
        let wide_window = RiskScanner::new()
            .with_expiry_window_days(30)
            .scan(&snapshot.products, &snapshot.offers, today())
            .unwrap();
        let expiring: Vec<&str> = wide_window
            .expiring_soon
            .iter()
            .map(|i| i.product_id.0.as_str())
            .collect();
        assert_eq!(expiring, vec!["P-PEP"]);

        // Pepperoni has 5 days of supply, so it moves to the low-stock list
        let both = RiskScanner::new()
            .with_low_stock_days(6.0)
            .with_expiry_window_days(30)
            .scan(&snapshot.products, &snapshot.offers, today())
            .unwrap();
        assert!(both.low_stock.iter().any(|i| i.product_id.0 == "P-PEP"));
        assert!(both.expiring_soon.is_empty());
    }
}
