//! Negotiation transport: HTTP + JSON between buyer and vendors

pub mod client;
pub mod message;
pub mod pricing;
pub mod server;

pub use client::{HttpVendorClient, VendorTransport, DEFAULT_TIMEOUT};
pub use message::{
    AgentCapabilities, AgentCard, NegotiationResult, OfferRequest, Outcome, VendorResponse,
    AGENT_CARD_PATH, PROTOCOL_VERSION,
};
pub use pricing::{PriceTable, VendorProfile, BULK_THRESHOLD};
pub use server::{agent_card, hub_router, serve, vendor_router, HubHealth, HubVendor};
