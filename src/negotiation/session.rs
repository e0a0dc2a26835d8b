//! Negotiation session management

use crate::catalog::{DealReceipt, PriceGuard, Product};
use crate::error::{Result, VeganFlowError};
use crate::types::{ProductID, SessionID, VendorID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ranker::Candidate;
use super::types::{AcceptedDeal, NegotiationOutcome, NegotiationState, OfferRound, RoundResponse};

/// One procurement attempt for a (product, quantity) pair
#[derive(Clone, Debug)]
pub struct NegotiationSession {
    session_id: SessionID,
    product: Product,
    quantity: u32,
    candidates: Vec<Candidate>,
    price_guard: Option<PriceGuard>,
    state: NegotiationState,
    rounds: Vec<OfferRound>,
    deal: Option<AcceptedDeal>,
    started_at: DateTime<Utc>,
}

impl NegotiationSession {
    /// Create a session over an already ranked candidate queue
    pub fn new(product: Product, quantity: u32, candidates: Vec<Candidate>) -> Self {
        Self {
            session_id: SessionID::generate(&product.product_id, quantity),
            product,
            quantity,
            candidates,
            price_guard: None,
            state: NegotiationState::Init,
            rounds: Vec::new(),
            deal: None,
            started_at: Utc::now(),
        }
    }

    /// Bound offers by the product's price ceiling
    pub fn with_price_guard(mut self, guard: Option<PriceGuard>) -> Self {
        self.price_guard = guard;
        self
    }

    pub fn price_guard(&self) -> Option<&PriceGuard> {
        self.price_guard.as_ref()
    }

    pub fn session_id(&self) -> &SessionID {
        &self.session_id
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    pub fn rounds(&self) -> &[OfferRound] {
        &self.rounds
    }

    pub fn deal(&self) -> Option<&AcceptedDeal> {
        self.deal.as_ref()
    }

    /// Update state
    pub fn set_state(&mut self, state: NegotiationState) -> Result<()> {
        if self.state.is_terminal() {
            return Err(VeganFlowError::InvalidStateTransition(format!(
                "session {} is already {:?}",
                self.session_id, self.state
            )));
        }

        self.state = state;
        Ok(())
    }

    /// Append a round for the candidate at `index`
    pub fn record_round(
        &mut self,
        index: usize,
        offered_price: Decimal,
        response: RoundResponse,
    ) -> Result<&OfferRound> {
        if self.state.is_terminal() {
            return Err(VeganFlowError::InvalidStateTransition(
                "Cannot record a round on a finished session".to_string(),
            ));
        }

        let candidate = self.candidates.get(index).ok_or_else(|| {
            VeganFlowError::Internal(format!("no candidate vendor at position {index}"))
        })?;

        let round = OfferRound {
            round: self.rounds.len() as u32 + 1,
            vendor_id: candidate.vendor.vendor_id.clone(),
            vendor_name: candidate.vendor.name.clone(),
            endpoint: candidate.vendor.endpoint.clone(),
            offered_price,
            quantity: self.quantity,
            response,
            at: Utc::now(),
        };

        self.rounds.push(round);
        Ok(&self.rounds[self.rounds.len() - 1])
    }

    /// Finish with an agreed deal
    pub fn accept(&mut self, deal: AcceptedDeal) -> Result<()> {
        self.set_state(NegotiationState::Accepted)?;
        self.deal = Some(deal);
        Ok(())
    }

    /// Cancel the session
    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.state = NegotiationState::Cancelled {
            reason: reason.into(),
        };
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, NegotiationState::Cancelled { .. })
    }

    /// Vendors that never gave a structured response
    pub fn unreachable_vendors(&self) -> Vec<VendorID> {
        self.candidates
            .iter()
            .map(|c| &c.vendor.vendor_id)
            .filter(|id| {
                let mut rounds = self.rounds.iter().filter(|r| &r.vendor_id == *id).peekable();
                rounds.peek().is_some() && rounds.all(|r| !r.response.is_structured())
            })
            .cloned()
            .collect()
    }

    /// Snapshot the finished session for the caller
    pub fn into_report(self, receipt: Option<DealReceipt>) -> Result<NegotiationReport> {
        let outcome = match self.state {
            NegotiationState::Accepted => NegotiationOutcome::Accepted,
            NegotiationState::VendorExhausted => NegotiationOutcome::Exhausted,
            NegotiationState::TransportFailure => NegotiationOutcome::TransportFailure,
            NegotiationState::NoOffersAvailable => NegotiationOutcome::NoOffersAvailable,
            ref other => {
                return Err(VeganFlowError::InvalidStateTransition(format!(
                    "session {} has no outcome in state {:?}",
                    self.session_id, other
                )))
            }
        };

        let unreachable_vendors = self.unreachable_vendors();
        let vendors_tried = self
            .candidates
            .iter()
            .filter(|c| self.rounds.iter().any(|r| r.vendor_id == c.vendor.vendor_id))
            .count();

        Ok(NegotiationReport {
            session_id: self.session_id,
            product_id: self.product.product_id,
            product_name: self.product.name,
            quantity: self.quantity,
            outcome,
            deal: self.deal,
            receipt,
            price_guard: self.price_guard,
            vendors_considered: self.candidates.len(),
            vendors_tried,
            unreachable_vendors,
            rounds: self.rounds,
            started_at: self.started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Caller-facing result of a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NegotiationReport {
    pub session_id: SessionID,
    pub product_id: ProductID,
    pub product_name: String,
    pub quantity: u32,
    pub outcome: NegotiationOutcome,
    pub deal: Option<AcceptedDeal>,
    pub receipt: Option<DealReceipt>,
    pub price_guard: Option<PriceGuard>,
    pub vendors_considered: usize,
    pub vendors_tried: usize,
    pub unreachable_vendors: Vec<VendorID>,
    pub rounds: Vec<OfferRound>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl NegotiationReport {
    pub fn is_accepted(&self) -> bool {
        self.outcome == NegotiationOutcome::Accepted
    }

    /// The failure as an error, for callers that treat anything but a deal
    /// as one. `None` for accepted sessions and for products nobody offers.
    pub fn failure(&self) -> Option<VeganFlowError> {
        match self.outcome {
            NegotiationOutcome::Accepted | NegotiationOutcome::NoOffersAvailable => None,
            NegotiationOutcome::Exhausted => Some(VeganFlowError::VendorExhausted {
                product: self.product_name.clone(),
                vendors: self.vendors_considered,
                rounds: self.rounds.len(),
            }),
            NegotiationOutcome::TransportFailure => Some(VeganFlowError::AllVendorsUnreachable {
                product: self.product_name.clone(),
                vendors: self.vendors_considered,
            }),
        }
    }
}
