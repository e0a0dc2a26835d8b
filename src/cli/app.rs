//! VeganFlow application wiring the catalog, transport and coordinator

use crate::catalog::{run_query, CatalogGateway, CatalogQuery, CatalogReport, CatalogSnapshot, InMemoryCatalog};
use crate::config::AppConfig;
use crate::error::Result;
use crate::inventory::{RiskReport, RiskScanner};
use crate::negotiation::{NegotiationCoordinator, NegotiationReport, Replenishment};
use crate::seed::{demo_profiles, demo_snapshot};
use crate::transport::{hub_router, serve, vendor_router, HttpVendorClient, PriceTable, VendorProfile, VendorTransport};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Buyer-side application
pub struct ProcurementApp {
    config: AppConfig,
    catalog: Arc<dyn CatalogGateway>,
    coordinator: NegotiationCoordinator,
}

impl ProcurementApp {
    /// Build the app from config: the catalog comes from `catalog.seed_path`
    /// or the demo store, and vendors are reached over HTTP.
    pub fn new(config: AppConfig) -> Result<Self> {
        let snapshot = match &config.catalog.seed_path {
            Some(path) => {
                tracing::info!("Loading catalog from {}", path.display());
                CatalogSnapshot::from_json_file(path)?
            }
            None => demo_snapshot(today(), &config.catalog.vendor_hub_url),
        };

        let catalog: Arc<dyn CatalogGateway> = Arc::new(InMemoryCatalog::new(snapshot));
        let transport: Arc<dyn VendorTransport> =
            Arc::new(HttpVendorClient::new(config.transport_timeout())?);

        Ok(Self::with_parts(config, catalog, transport))
    }

    pub fn with_parts(
        config: AppConfig,
        catalog: Arc<dyn CatalogGateway>,
        transport: Arc<dyn VendorTransport>,
    ) -> Self {
        let coordinator =
            NegotiationCoordinator::new(catalog.clone(), transport).with_policy(config.policy());
        Self {
            config,
            catalog,
            coordinator,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> Arc<dyn CatalogGateway> {
        self.catalog.clone()
    }

    /// Full risk scan of the catalog
    pub async fn scan(&self, today: NaiveDate) -> Result<RiskReport> {
        let snapshot = self.catalog.snapshot().await?;
        RiskScanner::new().scan(&snapshot.products, &snapshot.offers, today)
    }

    pub async fn query(
        &self,
        query_type: &str,
        product: Option<&str>,
        today: NaiveDate,
    ) -> Result<CatalogReport> {
        let query = CatalogQuery::parse(query_type, product)?;
        run_query(self.catalog.as_ref(), &query, today).await
    }

    pub async fn negotiate(
        &self,
        product: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> Result<NegotiationReport> {
        self.coordinator.negotiate(product, quantity, cancel).await
    }

    pub async fn replenish(
        &self,
        concurrency: Option<usize>,
        today: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<Replenishment>> {
        let concurrency = concurrency.unwrap_or(self.config.negotiation.max_concurrent_sessions);
        self.coordinator
            .replenish_low_stock(today, concurrency, cancel)
            .await
    }
}

/// Local calendar date used for expiry calculations
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Serve every demo vendor until `shutdown` fires
pub async fn run_hub(config: &AppConfig, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let public_url = config.public_url();
    let profiles = demo_profiles()?;

    tracing::info!("Vendor hub mounting {} vendors at {}", profiles.len(), public_url);
    serve(listener, hub_router(profiles, &public_url), shutdown).await
}

/// Serve a single vendor until `shutdown` fires
pub async fn run_vendor(
    config: &AppConfig,
    name: &str,
    slug: &str,
    reliability: Decimal,
    port: u16,
    shutdown: CancellationToken,
) -> Result<()> {
    let profile = VendorProfile::new(slug, name, reliability, PriceTable::market_default())?;
    let bind = format!("{}:{}", config.server.bind_address, port);
    let endpoint = config
        .server
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://{bind}"));

    let listener = TcpListener::bind(&bind).await?;
    tracing::info!("{} ({}) serving at {}", name, slug, endpoint);
    serve(listener, vendor_router(profile, &endpoint), shutdown).await
}
