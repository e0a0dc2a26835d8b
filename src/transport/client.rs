//! Buyer-side HTTP client

use crate::error::{Result, VeganFlowError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::message::{AgentCard, NegotiationResult, OfferRequest, VendorResponse, AGENT_CARD_PATH};

/// Default bound on every transport call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Request/response link to a remote vendor
#[async_trait]
pub trait VendorTransport: Send + Sync {
    /// Fetch and check the vendor's agent card
    async fn discover(&self, endpoint: &str) -> Result<AgentCard>;

    /// Send one offer and wait for the vendor's decision
    async fn offer(&self, endpoint: &str, offer: &OfferRequest) -> Result<VendorResponse>;
}

/// [`VendorTransport`] over HTTP with JSON bodies
#[derive(Clone, Debug)]
pub struct HttpVendorClient {
    client: Client,
}

impl HttpVendorClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VeganFlowError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Vendor routes are mounted without a trailing slash
    fn base_url(endpoint: &str) -> &str {
        endpoint.trim_end_matches('/')
    }

    fn card_url(endpoint: &str) -> String {
        format!("{}{}", Self::base_url(endpoint), AGENT_CARD_PATH)
    }
}

#[async_trait]
impl VendorTransport for HttpVendorClient {
    async fn discover(&self, endpoint: &str) -> Result<AgentCard> {
        let failure = |reason: String| VeganFlowError::DiscoveryFailure {
            endpoint: endpoint.to_string(),
            reason,
        };

        let url = Self::card_url(endpoint);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("status {status}")));
        }

        let card: AgentCard = response
            .json()
            .await
            .map_err(|e| failure(format!("bad agent card: {e}")))?;

        if !card.supports_negotiation() {
            return Err(failure(format!(
                "{} does not advertise negotiation",
                card.name
            )));
        }

        Ok(card)
    }

    async fn offer(&self, endpoint: &str, offer: &OfferRequest) -> Result<VendorResponse> {
        let url = Self::base_url(endpoint);
        tracing::debug!(
            "POST {}: {} x {} at ${}",
            url,
            offer.quantity,
            offer.product,
            offer.offer_price
        );

        let response = self
            .client
            .post(url)
            .json(offer)
            .send()
            .await
            .map_err(|e| VeganFlowError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VeganFlowError::Transport {
                endpoint: endpoint.to_string(),
                reason: format!("status {status}"),
            });
        }

        let result: NegotiationResult =
            response
                .json()
                .await
                .map_err(|e| VeganFlowError::MalformedResponse {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })?;

        result.into_response(endpoint)
    }
}
