//! Inventory risk scanning

pub mod scanner;

pub use scanner::{
    ExpiringItem, LowStockItem, RiskClass, RiskReport, RiskScanner, EXPIRY_WINDOW_DAYS,
    LOW_STOCK_DAYS,
};
