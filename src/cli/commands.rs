//! CLI command definitions

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "veganflow")]
#[command(about = "VeganFlow - automated procurement negotiation for grocery retail", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults to ./veganflow.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve every demo vendor on one port, mounted under /{slug}
    ServeHub {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Serve a single vendor
    ServeVendor {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// URL path segment used in the advertised endpoint
        #[arg(short, long)]
        slug: String,

        /// Reliability score in (0, 1]
        #[arg(short, long)]
        reliability: Decimal,

        /// Port to listen on
        #[arg(short, long, default_value = "9001")]
        port: u16,
    },

    /// Scan inventory for low-stock and expiring products
    Scan,

    /// Run a catalog query
    Query {
        /// LOW_STOCK, EXPIRING_SOON, PRODUCT_DETAIL or ALL
        #[arg(short = 't', long = "type")]
        query_type: String,

        /// Product name (required for PRODUCT_DETAIL)
        #[arg(short, long)]
        product: Option<String>,
    },

    /// Negotiate a purchase with the ranked vendors
    Negotiate {
        /// Product ID or name
        #[arg(short, long)]
        product: String,

        /// Units to buy
        #[arg(short, long)]
        quantity: u32,
    },

    /// Reorder every low-stock product up to its target level
    Replenish {
        /// Sessions to run at once (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,
    },
}
