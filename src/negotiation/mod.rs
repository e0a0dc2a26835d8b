//! Negotiation module: vendor ranking, sessions and the coordinator

pub mod coordinator;
pub mod ranker;
pub mod session;
pub mod types;

pub use coordinator::{NegotiationCoordinator, Replenishment, DEFAULT_MAX_CONCURRENT_SESSIONS};
pub use ranker::{rank_offers, Candidate, Ranking, VendorRanker};
pub use session::{NegotiationReport, NegotiationSession};
pub use types::{
    AcceptedDeal, NegotiationOutcome, NegotiationState, OfferRound, RoundResponse,
    StrategyPolicy, UnreachableStage, MAX_RETRIES_PER_VENDOR, OPENING_MARKDOWN,
};
