//! Error types for VeganFlow

use thiserror::Error;

/// Main error type for VeganFlow
#[derive(Error, Debug)]
pub enum VeganFlowError {
    // Catalog errors
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Product name '{query}' is ambiguous: matches {candidates:?}")]
    AmbiguousProduct {
        query: String,
        candidates: Vec<String>,
    },

    #[error("Invalid sales velocity for {product_id}: {velocity}")]
    InvalidVelocity { product_id: String, velocity: f64 },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid vendor: {0}")]
    InvalidVendor(String),

    #[error("Invalid catalog query: {0}")]
    InvalidQuery(String),

    #[error("Deal already committed for {product_id} by another session (rejected session {session_id})")]
    DealConflict {
        product_id: String,
        session_id: String,
    },

    #[error("Catalog error: {0}")]
    Catalog(String),

    // Transport errors
    #[error("Discovery failed for {endpoint}: {reason}")]
    DiscoveryFailure { endpoint: String, reason: String },

    #[error("Transport error talking to {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    // Negotiation errors
    #[error("All {vendors} vendors exhausted for {product} after {rounds} rounds")]
    VendorExhausted {
        product: String,
        vendors: usize,
        rounds: usize,
    },

    #[error("All {vendors} vendors unreachable for {product}")]
    AllVendorsUnreachable { product: String, vendors: usize },

    #[error("Negotiation cancelled: {0}")]
    NegotiationCancelled(String),

    #[error("Invalid negotiation state transition: {0}")]
    InvalidStateTransition(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VeganFlowError {
    /// Whether the coordinator may retry the vendor or fall back to the next one.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VeganFlowError::DiscoveryFailure { .. }
                | VeganFlowError::Transport { .. }
                | VeganFlowError::MalformedResponse { .. }
        )
    }
}

/// Result type alias for VeganFlow operations
pub type Result<T> = std::result::Result<T, VeganFlowError>;
