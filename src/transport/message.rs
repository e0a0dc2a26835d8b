//! Wire messages exchanged between buyer and vendor

use crate::error::{Result, VeganFlowError};
use crate::types::round_cents;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discovery document path, relative to a vendor's base endpoint
pub const AGENT_CARD_PATH: &str = "/.well-known/agent-card.json";

/// Protocol version advertised in agent cards
pub const PROTOCOL_VERSION: &str = "0.3.0";

/// Capabilities advertised by a vendor
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapabilities {
    #[serde(default)]
    pub negotiation: bool,
    #[serde(default)]
    pub streaming: bool,
}

/// Vendor descriptor served at [`AGENT_CARD_PATH`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub endpoint: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    pub protocol_version: String,
}

impl AgentCard {
    pub fn supports_negotiation(&self) -> bool {
        self.capabilities.negotiation
    }
}

/// Purchase offer sent by the buyer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferRequest {
    pub product: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub offer_price: Decimal,
}

/// Vendor decision
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Accepted,
    Counter,
    Rejected,
}

/// Structured vendor reply as it appears on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationResult {
    pub outcome: Outcome,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub delivery_days: Option<u32>,
    #[serde(default)]
    pub message: String,
}

impl NegotiationResult {
    pub fn accepted(price: Decimal, delivery_days: u32, message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Accepted,
            price: Some(price),
            delivery_days: Some(delivery_days),
            message: message.into(),
        }
    }

    pub fn counter(price: Decimal, message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Counter,
            price: Some(price),
            delivery_days: None,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Rejected,
            price: None,
            delivery_days: None,
            message: message.into(),
        }
    }

    /// Check the reply against the contract and turn it into a typed
    /// response. Prices are normalized to cents. `endpoint` is only used for
    /// error reporting.
    pub fn into_response(self, endpoint: &str) -> Result<VendorResponse> {
        let malformed = |reason: &str| VeganFlowError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let price = self.price.map(round_cents);
        if let Some(price) = price {
            if price <= Decimal::ZERO {
                return Err(malformed("non-positive price"));
            }
        }

        match self.outcome {
            Outcome::Accepted => {
                let delivery_days = self
                    .delivery_days
                    .ok_or_else(|| malformed("ACCEPTED without delivery_days"))?;
                Ok(VendorResponse::Accepted {
                    price,
                    delivery_days,
                })
            }
            Outcome::Counter => {
                let price = price.ok_or_else(|| malformed("COUNTER without price"))?;
                Ok(VendorResponse::Counter { price })
            }
            Outcome::Rejected => Ok(VendorResponse::Rejected {
                message: self.message,
            }),
        }
    }
}

/// Validated vendor reply
#[derive(Clone, Debug, PartialEq)]
pub enum VendorResponse {
    /// `price` echoes the accepted price when the vendor includes it
    Accepted {
        price: Option<Decimal>,
        delivery_days: u32,
    },
    Counter {
        price: Decimal,
    },
    Rejected {
        message: String,
    },
}
