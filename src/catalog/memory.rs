//! In-memory catalog gateway

use crate::error::{Result, VeganFlowError};
use crate::types::ProductID;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::gateway::CatalogGateway;
use super::types::{CatalogSnapshot, DealCommit, DealReceipt};

struct CatalogState {
    snapshot: CatalogSnapshot,
    /// Open deal per product
    deals: HashMap<ProductID, DealReceipt>,
}

/// Catalog held in process memory.
///
/// Commits take the write lock, so they are serialized across all sessions.
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            state: RwLock::new(CatalogState {
                snapshot,
                deals: HashMap::new(),
            }),
        }
    }
}

#[async_trait]
impl CatalogGateway for InMemoryCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot> {
        Ok(self.state.read().await.snapshot.clone())
    }

    async fn commit_deal(&self, deal: DealCommit) -> Result<DealReceipt> {
        if deal.quantity == 0 {
            return Err(VeganFlowError::InvalidQuantity(
                "cannot commit a deal for zero units".to_string(),
            ));
        }
        if deal.price <= Decimal::ZERO {
            return Err(VeganFlowError::Catalog(format!(
                "refusing deal at non-positive price {}",
                deal.price
            )));
        }

        let mut state = self.state.write().await;

        if state.snapshot.product(&deal.product_id).is_none() {
            return Err(VeganFlowError::ProductNotFound(deal.product_id.0.clone()));
        }
        if state.snapshot.vendor(&deal.vendor_id).is_none() {
            return Err(VeganFlowError::InvalidVendor(format!(
                "unknown vendor {}",
                deal.vendor_id
            )));
        }

        if let Some(existing) = state.deals.get(&deal.product_id) {
            if existing.deal.session_id == deal.session_id {
                tracing::debug!(
                    "Commit for {} replayed by session {}",
                    deal.product_id,
                    deal.session_id
                );
                let mut replay = existing.clone();
                replay.replayed = true;
                return Ok(replay);
            }
            return Err(VeganFlowError::DealConflict {
                product_id: deal.product_id.0.clone(),
                session_id: deal.session_id.0.clone(),
            });
        }

        let receipt = DealReceipt {
            deal,
            committed_at: Utc::now(),
            replayed: false,
        };
        state
            .deals
            .insert(receipt.deal.product_id.clone(), receipt.clone());

        tracing::info!(
            "Committed deal: {} x {} from {} @ {} (session {})",
            receipt.deal.quantity,
            receipt.deal.product_id,
            receipt.deal.vendor_id,
            receipt.deal.price,
            receipt.deal.session_id
        );

        Ok(receipt)
    }

    async fn deals(&self) -> Result<Vec<DealReceipt>> {
        let state = self.state.read().await;
        let mut deals: Vec<DealReceipt> = state.deals.values().cloned().collect();
        deals.sort_by(|a, b| a.deal.product_id.cmp(&b.deal.product_id));
        Ok(deals)
    }
}
