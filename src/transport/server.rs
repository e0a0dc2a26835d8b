//! Vendor-side HTTP server
//!
//! A vendor router serves its agent card and answers offers. A hub mounts
//! several vendor routers under `/{slug}` and reports health at `/`.

use crate::error::Result;
use crate::types::round_cents;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::message::{
    AgentCapabilities, AgentCard, NegotiationResult, OfferRequest, AGENT_CARD_PATH,
    PROTOCOL_VERSION,
};
use super::pricing::VendorProfile;

struct VendorState {
    profile: VendorProfile,
    card: AgentCard,
}

/// Build the agent card a vendor advertises at `endpoint`
pub fn agent_card(profile: &VendorProfile, endpoint: &str) -> AgentCard {
    AgentCard {
        name: profile.name().to_string(),
        description: format!("Automated sales agent for {}", profile.name()),
        endpoint: endpoint.to_string(),
        capabilities: AgentCapabilities {
            negotiation: true,
            streaming: false,
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
    }
}

/// Router for a single vendor reachable at `public_endpoint`
pub fn vendor_router(profile: VendorProfile, public_endpoint: &str) -> Router {
    let card = agent_card(&profile, public_endpoint);
    let state = Arc::new(VendorState { profile, card });

    Router::new()
        .route(AGENT_CARD_PATH, get(card_handler))
        .route("/", get(card_handler).post(offer_handler))
        .with_state(state)
}

async fn card_handler(State(state): State<Arc<VendorState>>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn offer_handler(
    State(state): State<Arc<VendorState>>,
    Json(mut offer): Json<OfferRequest>,
) -> Json<NegotiationResult> {
    offer.offer_price = round_cents(offer.offer_price);

    let result = state.profile.evaluate(&offer);

    tracing::info!(
        "{} received offer: {} x {} at ${} -> {:?}",
        state.profile.name(),
        offer.quantity,
        offer.product,
        offer.offer_price,
        result.outcome
    );

    Json(result)
}

/// Entry in the hub's health listing
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HubVendor {
    pub name: String,
    pub slug: String,
    pub endpoint: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HubHealth {
    pub status: &'static str,
    pub vendor_count: usize,
    pub vendors: Vec<HubVendor>,
}

/// Router mounting every profile under `/{slug}`; `public_base` is the URL
/// the hub is reachable at and is used to build each vendor's endpoint.
pub fn hub_router(profiles: Vec<VendorProfile>, public_base: &str) -> Router {
    let base = public_base.trim_end_matches('/');
    let mut listing = Vec::with_capacity(profiles.len());
    let mut router = Router::new();

    for profile in profiles {
        let endpoint = format!("{}/{}", base, profile.slug());
        listing.push(HubVendor {
            name: profile.name().to_string(),
            slug: profile.slug().to_string(),
            endpoint: endpoint.clone(),
        });
        let path = format!("/{}", profile.slug());
        router = router.nest(&path, vendor_router(profile, &endpoint));
    }

    let health = Arc::new(HubHealth {
        status: "ok",
        vendor_count: listing.len(),
        vendors: listing,
    });

    router.route(
        "/",
        get(move || {
            let health = health.clone();
            async move { Json((*health).clone()) }
        }),
    )
}

/// Serve `router` on `listener` until `shutdown` is cancelled
pub async fn serve(listener: TcpListener, router: Router, shutdown: CancellationToken) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("Vendor server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Vendor server on {} stopped", addr);
    Ok(())
}
