//! Negotiation coordinator: drives sessions against ranked vendors and
//! commits accepted deals

use crate::catalog::{CatalogGateway, DealCommit, DealReceipt};
use crate::error::{Result, VeganFlowError};
use crate::inventory::RiskScanner;
use crate::transport::{OfferRequest, VendorResponse, VendorTransport};
use crate::types::ProductID;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::ranker::VendorRanker;
use super::session::{NegotiationReport, NegotiationSession};
use super::types::{AcceptedDeal, NegotiationState, RoundResponse, StrategyPolicy, UnreachableStage};

/// Default number of replenishment sessions run at once
pub const DEFAULT_MAX_CONCURRENT_SESSIONS: usize = 4;

/// How a single vendor's turn ended
enum VendorVerdict {
    Deal(AcceptedDeal),
    Exhausted,
    Unreachable,
    Cancelled,
}

/// Result of one replenishment session
#[derive(Clone, Debug, Serialize)]
pub struct Replenishment {
    pub product_id: ProductID,
    pub name: String,
    pub quantity: u32,
    pub report: Option<NegotiationReport>,
    pub error: Option<String>,
}

/// Orchestrates ranking, offers and commits
pub struct NegotiationCoordinator {
    catalog: Arc<dyn CatalogGateway>,
    transport: Arc<dyn VendorTransport>,
    ranker: VendorRanker,
    policy: StrategyPolicy,
}

impl NegotiationCoordinator {
    pub fn new(catalog: Arc<dyn CatalogGateway>, transport: Arc<dyn VendorTransport>) -> Self {
        Self {
            catalog,
            transport,
            ranker: VendorRanker::new(),
            policy: StrategyPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StrategyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &StrategyPolicy {
        &self.policy
    }

    /// Procure `quantity` units of the product matching `product_name`.
    ///
    /// Vendor failures are absorbed into the report; errors are returned for
    /// bad input, catalog failures and cancellation.
    pub async fn negotiate(
        &self,
        product_name: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> Result<NegotiationReport> {
        if quantity == 0 {
            return Err(VeganFlowError::InvalidQuantity(format!(
                "cannot order zero units of {product_name}"
            )));
        }

        let snapshot = self.catalog.snapshot().await?;
        let ranking = self.ranker.rank(&snapshot, product_name)?;
        let candidates = ranking.candidates(&snapshot);
        let guard = snapshot.price_guard(&ranking.product.product_id).cloned();
        let mut session =
            NegotiationSession::new(ranking.product, quantity, candidates).with_price_guard(guard);

        tracing::info!(
            "Session {} started: {} x {} across {} vendors",
            session.session_id(),
            quantity,
            session.product().name,
            session.candidates().len()
        );

        if session.candidates().is_empty() {
            tracing::info!("No offers for {}", session.product().name);
            session.set_state(NegotiationState::NoOffersAvailable)?;
            return session.into_report(None);
        }

        let mut unreachable = 0;
        for index in 0..session.candidates().len() {
            if cancel.is_cancelled() {
                return Err(Self::cancelled(&mut session));
            }

            match self.negotiate_with(&mut session, index, cancel).await? {
                VendorVerdict::Deal(deal) => {
                    if cancel.is_cancelled() {
                        return Err(Self::cancelled(&mut session));
                    }
                    return self.commit(session, deal).await;
                }
                VendorVerdict::Exhausted => {}
                VendorVerdict::Unreachable => unreachable += 1,
                VendorVerdict::Cancelled => return Err(Self::cancelled(&mut session)),
            }
        }

        let terminal = if unreachable == session.candidates().len() {
            tracing::warn!(
                "Session {}: every vendor was unreachable",
                session.session_id()
            );
            NegotiationState::TransportFailure
        } else {
            tracing::info!("Session {}: all vendors exhausted", session.session_id());
            NegotiationState::VendorExhausted
        };
        session.set_state(terminal)?;
        session.into_report(None)
    }

    /// Run one vendor's turn: discovery, then up to two offers
    async fn negotiate_with(
        &self,
        session: &mut NegotiationSession,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<VendorVerdict> {
        let candidate = session.candidates()[index].clone();
        let endpoint = candidate.vendor.endpoint.as_str();
        let next_list_price = session
            .candidates()
            .get(index + 1)
            .map(|c| c.offer.price_wholesale);

        let opening = self.policy.opening_offer(candidate.offer.price_wholesale);
        let ceiling = session.price_guard().map(|g| g.max_price);
        let mut retries_left = self.policy.retry_budget();

        if let Some(max_price) = ceiling.filter(|max| opening > *max) {
            tracing::info!(
                "Opening ${} to {} is over the ${} ceiling, skipping",
                opening,
                candidate.vendor.name,
                max_price
            );
            session.record_round(index, opening, RoundResponse::OverCeiling { max_price })?;
            return Ok(VendorVerdict::Exhausted);
        }

        loop {
            match Self::guarded(cancel, self.transport.discover(endpoint)).await {
                None => return Ok(VendorVerdict::Cancelled),
                Some(Ok(card)) => {
                    tracing::debug!("Discovered {} ({})", card.name, card.protocol_version);
                    break;
                }
                Some(Err(e)) if e.is_recoverable() => {
                    tracing::warn!("Discovery of {} failed: {}", candidate.vendor.name, e);
                    session.record_round(
                        index,
                        opening,
                        RoundResponse::Unreachable {
                            stage: UnreachableStage::Discovery,
                            reason: e.to_string(),
                        },
                    )?;
                    if retries_left == 0 {
                        return Ok(VendorVerdict::Unreachable);
                    }
                    retries_left -= 1;
                }
                Some(Err(e)) => return Err(e),
            }
        }

        let mut price = opening;
        let mut countered = false;
        let mut responded = false;

        loop {
            session.set_state(NegotiationState::Offering {
                vendor_id: candidate.vendor.vendor_id.clone(),
                price,
            })?;

            let request = OfferRequest {
                product: session.product().name.clone(),
                quantity: session.quantity(),
                offer_price: price,
            };

            let response = match Self::guarded(cancel, self.transport.offer(endpoint, &request)).await
            {
                None => return Ok(VendorVerdict::Cancelled),
                Some(Ok(response)) => response,
                Some(Err(e)) if e.is_recoverable() => {
                    tracing::warn!("Offer to {} failed: {}", candidate.vendor.name, e);
                    session.record_round(
                        index,
                        price,
                        RoundResponse::Unreachable {
                            stage: UnreachableStage::Offer,
                            reason: e.to_string(),
                        },
                    )?;
                    if retries_left == 0 {
                        return Ok(if responded {
                            VendorVerdict::Exhausted
                        } else {
                            VendorVerdict::Unreachable
                        });
                    }
                    retries_left -= 1;
                    continue;
                }
                Some(Err(e)) => return Err(e),
            };
            responded = true;

            match response {
                VendorResponse::Accepted { delivery_days, .. } => {
                    session.record_round(
                        index,
                        price,
                        RoundResponse::Accepted {
                            price,
                            delivery_days,
                        },
                    )?;
                    tracing::info!(
                        "{} accepted ${} for {} x {}",
                        candidate.vendor.name,
                        price,
                        session.quantity(),
                        session.product().name
                    );
                    return Ok(VendorVerdict::Deal(AcceptedDeal {
                        vendor_id: candidate.vendor.vendor_id.clone(),
                        vendor_name: candidate.vendor.name.clone(),
                        price,
                        quantity: session.quantity(),
                        delivery_days,
                    }));
                }
                VendorResponse::Rejected { message } => {
                    tracing::info!("{} rejected ${}: {}", candidate.vendor.name, price, message);
                    session.record_round(index, price, RoundResponse::Rejected { message })?;
                    return Ok(VendorVerdict::Exhausted);
                }
                VendorResponse::Counter { price: counter } => {
                    session.record_round(index, price, RoundResponse::Counter { price: counter })?;
                    session.set_state(NegotiationState::Countered {
                        vendor_id: candidate.vendor.vendor_id.clone(),
                        price: counter,
                    })?;

                    if countered {
                        tracing::info!(
                            "{} countered twice, moving on",
                            candidate.vendor.name
                        );
                        return Ok(VendorVerdict::Exhausted);
                    }
                    countered = true;

                    if !self.takes_counter(opening, counter, next_list_price) {
                        tracing::info!(
                            "{} countered ${}, not worth taking",
                            candidate.vendor.name,
                            counter
                        );
                        return Ok(VendorVerdict::Exhausted);
                    }

                    if let Some(max_price) = ceiling.filter(|max| counter > *max) {
                        tracing::info!(
                            "{} countered ${}, over the ${} ceiling",
                            candidate.vendor.name,
                            counter,
                            max_price
                        );
                        session.record_round(index, counter, RoundResponse::OverCeiling { max_price })?;
                        return Ok(VendorVerdict::Exhausted);
                    }

                    tracing::info!("{} countered ${}, re-offering", candidate.vendor.name, counter);
                    price = counter;
                }
            }
        }
    }

    /// Take a counter when it beats the next vendor's list price, or, for
    /// the last vendor, when it is within the configured premium.
    fn takes_counter(
        &self,
        opening: Decimal,
        counter: Decimal,
        next_list_price: Option<Decimal>,
    ) -> bool {
        match next_list_price {
            Some(next) => counter <= next,
            None => self.policy.accepts_last_counter(opening, counter),
        }
    }

    async fn commit(
        &self,
        mut session: NegotiationSession,
        deal: AcceptedDeal,
    ) -> Result<NegotiationReport> {
        let commit = DealCommit {
            session_id: session.session_id().clone(),
            product_id: session.product().product_id.clone(),
            vendor_id: deal.vendor_id.clone(),
            price: deal.price,
            quantity: deal.quantity,
            delivery_days: deal.delivery_days,
        };

        let receipt: DealReceipt = self.catalog.commit_deal(commit).await?;
        tracing::info!(
            "Session {} committed: {} x {} from {} at ${}",
            session.session_id(),
            deal.quantity,
            session.product().name,
            deal.vendor_name,
            deal.price
        );
        if let Some(guard) = session.price_guard() {
            if !guard.meets_target(deal.price) {
                tracing::info!(
                    "Session {}: ${} is over the ${} target for {}",
                    session.session_id(),
                    deal.price,
                    guard.target_price,
                    session.product().name
                );
            }
        }

        session.accept(deal)?;
        session.into_report(Some(receipt))
    }

    /// Race `call` against cancellation; `None` means cancelled
    async fn guarded<T>(
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T>>,
    ) -> Option<Result<T>> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = call => Some(result),
        }
    }

    fn cancelled(session: &mut NegotiationSession) -> VeganFlowError {
        tracing::warn!("Session {} cancelled", session.session_id());
        session.cancel("cancelled by caller");
        VeganFlowError::NegotiationCancelled(session.session_id().to_string())
    }

    /// Scan for low stock and reorder each short product up to its target
    /// level, running at most `concurrency` sessions at once.
    pub async fn replenish_low_stock(
        &self,
        today: NaiveDate,
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Replenishment>> {
        let snapshot = self.catalog.snapshot().await?;
        let report = RiskScanner::new().scan(&snapshot.products, &snapshot.offers, today)?;

        let orders: Vec<(ProductID, String, u32)> = report
            .low_stock
            .iter()
            .filter_map(|item| {
                let product = snapshot.product(&item.product_id)?;
                let quantity = product.reorder_quantity();
                (quantity > 0).then(|| (product.product_id.clone(), product.name.clone(), quantity))
            })
            .collect();

        tracing::info!(
            "Replenishing {} low-stock products ({} at a time)",
            orders.len(),
            concurrency.max(1)
        );

        let mut results: Vec<Replenishment> = stream::iter(orders)
            .map(|(product_id, name, quantity)| async move {
                let outcome = self.negotiate(&product_id.0, quantity, cancel).await;
                let (report, error) = match outcome {
                    Ok(report) => (Some(report), None),
                    Err(e) => {
                        tracing::warn!("Replenishment of {} failed: {}", name, e);
                        (None, Some(e.to_string()))
                    }
                };
                Replenishment {
                    product_id,
                    name,
                    quantity,
                    report,
                    error,
                }
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        results.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, InMemoryCatalog, PriceGuard};
    use crate::negotiation::types::NegotiationOutcome;
    use crate::seed::{demo_profiles, demo_snapshot};
    use crate::transport::{agent_card, AgentCard, VendorProfile};
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;

    const HUB: &str = "http://hub.test";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()
    }

    fn endpoint(slug: &str) -> String {
        format!("{HUB}/{slug}")
    }

    /// In-process vendors priced by their real profiles, with knobs for
    /// outages, scripted replies, hanging calls and cancelling the caller
    /// while an offer is answered.
    #[derive(Default)]
    struct FakeTransport {
        profiles: HashMap<String, VendorProfile>,
        down: HashSet<String>,
        scripted: Mutex<HashMap<String, VecDeque<Result<VendorResponse>>>>,
        offers: Mutex<Vec<(String, Decimal)>>,
        hang: bool,
        cancel_on_offer: Option<CancellationToken>,
    }

    impl FakeTransport {
        fn demo() -> Self {
            let profiles = demo_profiles()
                .unwrap()
                .into_iter()
                .map(|p| (endpoint(p.slug()), p))
                .collect();
            Self {
                profiles,
                ..Self::default()
            }
        }

        fn down(mut self, slug: &str) -> Self {
            self.down.insert(endpoint(slug));
            self
        }

        fn script(self, slug: &str, replies: Vec<Result<VendorResponse>>) -> Self {
            self.scripted
                .lock()
                .unwrap()
                .insert(endpoint(slug), replies.into_iter().collect());
            self
        }

        fn offers_to(&self, slug: &str) -> Vec<Decimal> {
            let target = endpoint(slug);
            self.offers
                .lock()
                .unwrap()
                .iter()
                .filter(|(e, _)| *e == target)
                .map(|(_, p)| *p)
                .collect()
        }
    }

    #[async_trait]
    impl VendorTransport for FakeTransport {
        async fn discover(&self, endpoint: &str) -> Result<AgentCard> {
            if self.down.contains(endpoint) {
                return Err(VeganFlowError::DiscoveryFailure {
                    endpoint: endpoint.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            let profile = self.profiles.get(endpoint).ok_or_else(|| {
                VeganFlowError::DiscoveryFailure {
                    endpoint: endpoint.to_string(),
                    reason: "status 404 Not Found".to_string(),
                }
            })?;
            Ok(agent_card(profile, endpoint))
        }

        async fn offer(&self, endpoint: &str, offer: &OfferRequest) -> Result<VendorResponse> {
            if self.hang {
                futures::future::pending::<()>().await;
            }
            self.offers
                .lock()
                .unwrap()
                .push((endpoint.to_string(), offer.offer_price));

            let scripted = self
                .scripted
                .lock()
                .unwrap()
                .get_mut(endpoint)
                .and_then(|replies| replies.pop_front());
            let reply = match scripted {
                Some(reply) => reply,
                None => match self.profiles.get(endpoint) {
                    Some(profile) => profile.evaluate(offer).into_response(endpoint),
                    None => Err(VeganFlowError::Transport {
                        endpoint: endpoint.to_string(),
                        reason: "no such vendor".to_string(),
                    }),
                },
            };

            if let Some(token) = &self.cancel_on_offer {
                token.cancel();
            }
            reply
        }
    }

    fn setup(transport: FakeTransport) -> (Arc<InMemoryCatalog>, Arc<FakeTransport>, NegotiationCoordinator) {
        setup_with(demo_snapshot(today(), HUB), transport)
    }

    fn setup_with(
        snapshot: CatalogSnapshot,
        transport: FakeTransport,
    ) -> (Arc<InMemoryCatalog>, Arc<FakeTransport>, NegotiationCoordinator) {
        let catalog = Arc::new(InMemoryCatalog::new(snapshot));
        let transport = Arc::new(transport);
        let coordinator = NegotiationCoordinator::new(catalog.clone(), transport.clone());
        (catalog, transport, coordinator)
    }

    fn counter(cents: i64) -> Result<VendorResponse> {
        Ok(VendorResponse::Counter {
            price: Decimal::new(cents, 2),
        })
    }

    fn accepted(delivery_days: u32) -> Result<VendorResponse> {
        Ok(VendorResponse::Accepted {
            price: None,
            delivery_days,
        })
    }

    fn malformed(slug: &str) -> Result<VendorResponse> {
        Err(VeganFlowError::MalformedResponse {
            endpoint: endpoint(slug),
            reason: "expected value at line 1 column 1".to_string(),
        })
    }

    fn rejected() -> Result<VendorResponse> {
        Ok(VendorResponse::Rejected {
            message: "not interested".to_string(),
        })
    }

    #[tokio::test]
    async fn test_oat_milk_counter_is_taken() {
        let (catalog, transport, coordinator) = setup(FakeTransport::demo());

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::Accepted);
        let deal = report.deal.clone().unwrap();
        assert_eq!(deal.vendor_id.0, "V-03");
        assert_eq!(deal.price, Decimal::new(323, 2));
        assert_eq!(deal.delivery_days, 3);

        assert_eq!(
            transport.offers_to("clark"),
            vec![Decimal::new(293, 2), Decimal::new(323, 2)]
        );
        assert_eq!(report.rounds.len(), 2);
        assert_eq!(
            report.rounds[0].response,
            RoundResponse::Counter {
                price: Decimal::new(323, 2)
            }
        );

        let deals = catalog.deals().await.unwrap();
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].deal.session_id, report.session_id);
        assert!(report.receipt.is_some());
    }

    #[tokio::test]
    async fn test_first_vendor_unreachable_falls_back() {
        let (_, transport, coordinator) = setup(FakeTransport::demo().down("clark"));

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        // Earthly: opening 3.15, counter 3.60 (under LCG's 3.80), re-offer accepted
        assert_eq!(report.outcome, NegotiationOutcome::Accepted);
        let deal = report.deal.clone().unwrap();
        assert_eq!(deal.vendor_id.0, "V-01");
        assert_eq!(deal.price, Decimal::new(360, 2));

        let clark_rounds: Vec<_> = report
            .rounds
            .iter()
            .filter(|r| r.vendor_id.0 == "V-03")
            .collect();
        assert_eq!(clark_rounds.len(), 2);
        assert!(clark_rounds.iter().all(|r| !r.response.is_structured()));
        assert_eq!(report.unreachable_vendors, vec![crate::types::VendorID("V-03".to_string())]);
        assert!(transport.offers_to("clark").is_empty());
    }

    #[tokio::test]
    async fn test_all_vendors_unreachable() {
        let transport = FakeTransport::demo().down("clark").down("earthly").down("lcg");
        let (catalog, _, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::TransportFailure);
        assert_eq!(report.rounds.len(), 6);
        assert!(matches!(
            report.failure(),
            Some(VeganFlowError::AllVendorsUnreachable { vendors: 3, .. })
        ));
        assert!(catalog.deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offer_retry_recovers() {
        let transport = FakeTransport::demo().script(
            "clark",
            vec![Err(VeganFlowError::Transport {
                endpoint: endpoint("clark"),
                reason: "timed out".to_string(),
            })],
        );
        let (_, transport, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.deal.unwrap().vendor_id.0, "V-03");
        assert_eq!(transport.offers_to("clark").len(), 3);
        assert!(report.unreachable_vendors.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_retried_then_falls_back() {
        let transport =
            FakeTransport::demo().script("clark", vec![malformed("clark"), malformed("clark")]);
        let (catalog, transport, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transport.offers_to("clark"), vec![Decimal::new(293, 2); 2]);
        assert_eq!(report.unreachable_vendors, vec![crate::types::VendorID("V-03".to_string())]);
        assert!(matches!(
            report.rounds[1].response,
            RoundResponse::Unreachable {
                stage: UnreachableStage::Offer,
                ..
            }
        ));

        let deal = report.deal.unwrap();
        assert_eq!(deal.vendor_id.0, "V-01");
        assert_eq!(deal.price, Decimal::new(360, 2));
        assert_eq!(catalog.deals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_every_vendor_rejects() {
        let transport = FakeTransport::demo()
            .script("clark", vec![rejected()])
            .script("earthly", vec![rejected()])
            .script("lcg", vec![rejected()]);
        let (catalog, _, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("P-OAT1", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::Exhausted);
        assert_eq!(report.vendors_tried, 3);
        assert!(report.unreachable_vendors.is_empty());
        assert!(matches!(
            report.failure(),
            Some(VeganFlowError::VendorExhausted { vendors: 3, rounds: 3, .. })
        ));
        assert!(catalog.deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expensive_counter_advances() {
        // 3.60 is above Earthly's list price of 3.50
        let transport = FakeTransport::demo().script("clark", vec![counter(360)]);
        let (_, transport, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transport.offers_to("clark").len(), 1);
        assert_eq!(report.deal.unwrap().vendor_id.0, "V-01");
    }

    #[tokio::test]
    async fn test_second_counter_exhausts_vendor() {
        let transport = FakeTransport::demo().script("clark", vec![counter(323), counter(320)]);
        let (_, transport, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transport.offers_to("clark").len(), 2);
        assert_eq!(report.deal.unwrap().vendor_id.0, "V-01");
    }

    #[tokio::test]
    async fn test_last_vendor_counter_uncapped() {
        let (_, _, coordinator) = setup(FakeTransport::demo());

        // Treeline lists 8.90; opening 8.01, counter 9.87
        let report = coordinator
            .negotiate("Smoked Gouda", 10, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::Accepted);
        assert_eq!(report.deal.unwrap().price, Decimal::new(987, 2));
    }

    #[tokio::test]
    async fn test_last_vendor_counter_over_premium() {
        let (catalog, transport, coordinator) = setup(FakeTransport::demo());
        let coordinator = coordinator.with_policy(StrategyPolicy {
            last_vendor_max_premium: Some(Decimal::new(10, 2)),
            ..StrategyPolicy::default()
        });

        let report = coordinator
            .negotiate("Smoked Gouda", 10, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::Exhausted);
        assert_eq!(transport.offers_to("treeline"), vec![Decimal::new(801, 2)]);
        assert!(catalog.deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_terminates_within_vendor_budget() {
        let transport = FakeTransport::demo()
            .script("clark", vec![counter(300), counter(300)])
            .script("earthly", vec![counter(340), counter(340)])
            .script("lcg", vec![counter(370), counter(370)]);
        let (_, _, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::Exhausted);
        assert!(report.rounds.len() <= 2 * report.vendors_considered);
    }

    #[tokio::test]
    async fn test_no_offers_available() {
        let (_, _, coordinator) = setup(FakeTransport::demo());

        let report = coordinator
            .negotiate("Kale", 5, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::NoOffersAvailable);
        assert!(report.rounds.is_empty());
        assert!(report.failure().is_none());
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let (_, _, coordinator) = setup(FakeTransport::demo());
        let cancel = CancellationToken::new();

        assert!(matches!(
            coordinator.negotiate("Oat Barista Blend", 0, &cancel).await,
            Err(VeganFlowError::InvalidQuantity(_))
        ));
        assert!(matches!(
            coordinator.negotiate("Jackfruit", 10, &cancel).await,
            Err(VeganFlowError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (catalog, transport, coordinator) = setup(FakeTransport::demo());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = coordinator.negotiate("Oat Barista Blend", 40, &cancel).await;

        assert!(matches!(result, Err(VeganFlowError::NegotiationCancelled(_))));
        assert!(transport.offers_to("clark").is_empty());
        assert!(catalog.deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_mid_offer() {
        let transport = FakeTransport {
            hang: true,
            ..FakeTransport::demo()
        };
        let (catalog, _, coordinator) = setup(transport);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator.negotiate("Oat Barista Blend", 40, &cancel),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(VeganFlowError::NegotiationCancelled(_))));
        assert!(catalog.deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_while_vendor_accepts() {
        let cancel = CancellationToken::new();
        let transport = FakeTransport {
            cancel_on_offer: Some(cancel.clone()),
            ..FakeTransport::demo().script("clark", vec![accepted(3)])
        };
        let (catalog, transport, coordinator) = setup(transport);

        let result = coordinator.negotiate("Oat Barista Blend", 40, &cancel).await;

        assert!(matches!(result, Err(VeganFlowError::NegotiationCancelled(_))));
        assert_eq!(transport.offers_to("clark"), vec![Decimal::new(293, 2)]);
        assert!(catalog.deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counter_over_ceiling_is_withheld() {
        // Earthly's 3.65 beats LCG's 3.80 list but not the 3.60 oat ceiling
        let transport = FakeTransport::demo()
            .down("clark")
            .script("earthly", vec![counter(365)])
            .script("lcg", vec![accepted(2)]);
        let (catalog, transport, coordinator) = setup(transport);

        let report = coordinator
            .negotiate("Oat Barista Blend", 40, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(transport.offers_to("earthly"), vec![Decimal::new(315, 2)]);
        let earthly: Vec<_> = report
            .rounds
            .iter()
            .filter(|r| r.vendor_id.0 == "V-01")
            .collect();
        assert_eq!(earthly.len(), 2);
        assert_eq!(earthly[1].offered_price, Decimal::new(365, 2));
        assert_eq!(
            earthly[1].response,
            RoundResponse::OverCeiling {
                max_price: Decimal::new(360, 2)
            }
        );

        let deal = report.deal.clone().unwrap();
        assert_eq!(deal.vendor_id.0, "V-04");
        assert_eq!(deal.price, Decimal::new(342, 2));
        assert_eq!(report.price_guard.unwrap().target_price, Decimal::new(340, 2));
        assert_eq!(catalog.deals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_opening_over_ceiling_skips_vendor() {
        let mut snapshot = demo_snapshot(today(), HUB);
        snapshot.price_guards.push(PriceGuard {
            product_id: ProductID("P-SMOK".to_string()),
            target_price: Decimal::new(700, 2),
            max_price: Decimal::new(750, 2),
        });
        let (catalog, transport, coordinator) = setup_with(snapshot, FakeTransport::demo());

        let report = coordinator
            .negotiate("Smoked Gouda", 10, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, NegotiationOutcome::Exhausted);
        assert!(transport.offers_to("treeline").is_empty());
        assert_eq!(report.rounds.len(), 1);
        assert_eq!(report.rounds[0].offered_price, Decimal::new(801, 2));
        assert!(report.unreachable_vendors.is_empty());
        assert!(catalog.deals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replenish_low_stock() {
        let (catalog, _, coordinator) = setup(FakeTransport::demo());

        let results = coordinator
            .replenish_low_stock(today(), DEFAULT_MAX_CONCURRENT_SESSIONS, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        let oat = &results[0];
        assert_eq!(oat.product_id.0, "P-OAT1");
        assert_eq!(oat.quantity, 88);

        // Bulk floor is 2.926, so the 2.93 opening is accepted outright
        let report = oat.report.as_ref().unwrap();
        let deal = report.deal.as_ref().unwrap();
        assert_eq!(deal.vendor_id.0, "V-03");
        assert_eq!(deal.price, Decimal::new(293, 2));
        assert_eq!(report.rounds.len(), 1);

        assert_eq!(catalog.deals().await.unwrap().len(), 1);
    }
}
