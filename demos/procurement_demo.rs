//! Procurement demo: full shortage-to-deal workflow on one machine
//!
//! This example demonstrates the complete procurement loop:
//! 1. Start the vendor hub with every demo vendor
//! 2. Scan the store for low-stock and expiring products
//! 3. Rank the vendors offering oat milk
//! 4. Negotiate a purchase with counter-offer handling
//! 5. Replenish every low-stock product concurrently
//!
//! Run with: cargo run --example procurement_demo

use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use veganflow::catalog::CatalogReport;
use veganflow::cli::{today, ProcurementApp};
use veganflow::config::AppConfig;
use veganflow::negotiation::RoundResponse;
use veganflow::seed::demo_profiles;
use veganflow::transport::{hub_router, serve};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,veganflow=debug")
        .init();

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║   VeganFlow Procurement Demo                 ║");
    println!("╚══════════════════════════════════════════════╝\n");

    // Vendor hub on an ephemeral port
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let hub_url = format!("http://{}", listener.local_addr()?);
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(
        listener,
        hub_router(demo_profiles()?, &hub_url),
        shutdown.clone(),
    ));
    println!("📡 Vendor hub online at {}\n", hub_url);
    sleep(Duration::from_millis(200)).await;

    let mut config = AppConfig::default();
    config.catalog.vendor_hub_url = hub_url;
    let app = ProcurementApp::new(config)?;

    // =========================================================================
    // Scenario 1: Inventory scan
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 1: Inventory Scan                  │");
    println!("└─────────────────────────────────────────────┘");
    let report = app.scan(today()).await?;
    for item in &report.low_stock {
        println!(
            "   ⚠️  {} ({}): {} days of supply",
            item.name, item.product_id, item.days_of_supply
        );
    }
    for item in &report.expiring_soon {
        println!(
            "   ⏳ {} ({}): expires in {} days",
            item.name, item.product_id, item.days_until_expiry
        );
    }
    println!();

    // =========================================================================
    // Scenario 2: Vendor ranking
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 2: Vendor Ranking                  │");
    println!("└─────────────────────────────────────────────┘");
    if let CatalogReport::ProductDetail(detail) =
        app.query("PRODUCT_DETAIL", Some("Oat Barista Blend"), today()).await?
    {
        for (rank, offer) in detail.offers.iter().enumerate() {
            println!(
                "   {}. {} at ${} (MOQ {})",
                rank + 1,
                offer.vendor_name,
                offer.offer.price_wholesale,
                offer.offer.min_order_qty
            );
        }
    }
    println!();

    // =========================================================================
    // Scenario 3: Negotiation
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 3: Negotiate 40 x Oat Barista Blend│");
    println!("└─────────────────────────────────────────────┘");
    let cancel = CancellationToken::new();
    let session = app.negotiate("Oat Barista Blend", 40, &cancel).await?;
    for round in &session.rounds {
        let reply = match &round.response {
            RoundResponse::Accepted { delivery_days, .. } => {
                format!("ACCEPTED, delivery in {delivery_days} days")
            }
            RoundResponse::Counter { price } => format!("COUNTER ${price}"),
            RoundResponse::Rejected { message } => format!("REJECTED: {message}"),
            RoundResponse::Unreachable { reason, .. } => format!("UNREACHABLE: {reason}"),
            RoundResponse::OverCeiling { max_price } => format!("WITHHELD (ceiling ${max_price})"),
        };
        println!(
            "   Round {}: ${} to {} -> {}",
            round.round, round.offered_price, round.vendor_name, reply
        );
    }
    println!("   Outcome: {:?}\n", session.outcome);

    // =========================================================================
    // Scenario 4: Replenishment
    // =========================================================================
    println!("┌─────────────────────────────────────────────┐");
    println!("│ Scenario 4: Replenish Low Stock             │");
    println!("└─────────────────────────────────────────────┘");
    println!("   (oat milk already has an open deal from scenario 3)");
    for result in app.replenish(None, today(), &cancel).await? {
        match (&result.report, &result.error) {
            (Some(report), _) => println!(
                "   {} x {}: {:?}",
                result.quantity, result.name, report.outcome
            ),
            (None, Some(error)) => println!("   {} x {}: {}", result.quantity, result.name, error),
            (None, None) => {}
        }
    }

    shutdown.cancel();
    server.await??;

    println!("\n✅ Demo complete\n");
    Ok(())
}
