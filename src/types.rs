//! Core types used throughout VeganFlow

use blake2::{Blake2b512, Digest};
use rand::RngCore;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Catalog product identifier (e.g. `P-OAT1`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductID(pub String);

impl fmt::Display for ProductID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vendor identifier (e.g. `V-03`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VendorID(pub String);

impl fmt::Display for VendorID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Negotiation session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionID(pub String);

impl SessionID {
    /// Generate a fresh session ID for a (product, quantity) attempt.
    ///
    /// Two sessions for the same shortage get distinct IDs, so a retried
    /// commit can be told apart from a competing one.
    pub fn generate(product_id: &ProductID, quantity: u32) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut hasher = Blake2b512::new();
        hasher.update(product_id.0.as_bytes());
        hasher.update(quantity.to_be_bytes());
        hasher.update(nanos.to_be_bytes());
        hasher.update(nonce);
        let result = hasher.finalize();

        Self(format!("neg_{}", hex::encode(&result[..12])))
    }
}

impl fmt::Display for SessionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round a monetary amount to cents, half away from zero (2.925 -> 2.93).
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
