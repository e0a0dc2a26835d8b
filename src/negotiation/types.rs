//! Negotiation types and state machine

use crate::types::{round_cents, VendorID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fraction taken off a vendor's list price for the opening offer.
///
/// Fixed policy: the opening offer is always 90% of list, never an input.
pub const OPENING_MARKDOWN: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Transport errors tolerated per vendor before it counts as unreachable
pub const MAX_RETRIES_PER_VENDOR: u32 = 1;

/// Session state machine
///
/// `Init -> Offering -> {Accepted | Countered | VendorExhausted | TransportFailure}`;
/// `Countered` loops back to `Offering` with the same or the next vendor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NegotiationState {
    Init,
    Offering { vendor_id: VendorID, price: Decimal },
    Countered { vendor_id: VendorID, price: Decimal },
    Accepted,
    VendorExhausted,
    TransportFailure,
    NoOffersAvailable,
    Cancelled { reason: String },
}

impl NegotiationState {
    /// Check if the session has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NegotiationState::Accepted
                | NegotiationState::VendorExhausted
                | NegotiationState::TransportFailure
                | NegotiationState::NoOffersAvailable
                | NegotiationState::Cancelled { .. }
        )
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

/// Terminal outcome reported to the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegotiationOutcome {
    Accepted,
    Exhausted,
    TransportFailure,
    NoOffersAvailable,
}

/// Which call failed when a vendor could not be reached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableStage {
    Discovery,
    Offer,
}

/// What came back for one offer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundResponse {
    Accepted {
        price: Decimal,
        delivery_days: u32,
    },
    Counter {
        price: Decimal,
    },
    Rejected {
        message: String,
    },
    Unreachable {
        stage: UnreachableStage,
        reason: String,
    },
    /// The buyer withheld the offer because it was over the product's
    /// price ceiling; nothing was sent.
    OverCeiling {
        max_price: Decimal,
    },
}

impl RoundResponse {
    /// False only when the vendor could not be reached
    pub fn is_structured(&self) -> bool {
        !matches!(self, RoundResponse::Unreachable { .. })
    }
}

/// One entry of the append-only round history
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferRound {
    pub round: u32,
    pub vendor_id: VendorID,
    pub vendor_name: String,
    pub endpoint: String,
    pub offered_price: Decimal,
    pub quantity: u32,
    pub response: RoundResponse,
    pub at: DateTime<Utc>,
}

/// Terms agreed with a vendor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptedDeal {
    pub vendor_id: VendorID,
    pub vendor_name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub delivery_days: u32,
}

/// Tunable parts of the offer strategy
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyPolicy {
    /// Largest premium over the opening offer accepted from the last
    /// vendor's counter, as a fraction. `None` accepts any counter.
    pub last_vendor_max_premium: Option<Decimal>,
    /// Capped at [`MAX_RETRIES_PER_VENDOR`]; zero disables retries.
    pub retries_per_vendor: u32,
}

impl Default for StrategyPolicy {
    fn default() -> Self {
        Self {
            last_vendor_max_premium: None,
            retries_per_vendor: MAX_RETRIES_PER_VENDOR,
        }
    }
}

impl StrategyPolicy {
    /// Opening offer for a vendor listing at `list_price`
    pub fn opening_offer(&self, list_price: Decimal) -> Decimal {
        round_cents(list_price * (Decimal::ONE - OPENING_MARKDOWN))
    }

    pub fn retry_budget(&self) -> u32 {
        self.retries_per_vendor.min(MAX_RETRIES_PER_VENDOR)
    }

    /// Whether the last vendor's counter is close enough to take
    pub fn accepts_last_counter(&self, opening: Decimal, counter: Decimal) -> bool {
        match self.last_vendor_max_premium {
            None => true,
            Some(premium) => counter <= opening * (Decimal::ONE + premium),
        }
    }
}
