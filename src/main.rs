//! VeganFlow CLI binary

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use veganflow::cli::{run_hub, run_vendor, today, Cli, Commands, ProcurementApp};
use veganflow::config::{AppConfig, LoadOptions, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
    })
    .context("loading configuration")?;

    init_logging(&config);

    // Cancel in-flight sessions and stop servers on Ctrl+C
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            trigger.cancel();
        }
    });

    match cli.command {
        Commands::ServeHub { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            run_hub(&config, shutdown).await?;
        }

        Commands::ServeVendor {
            name,
            slug,
            reliability,
            port,
        } => {
            run_vendor(&config, &name, &slug, reliability, port, shutdown).await?;
        }

        Commands::Scan => {
            let app = ProcurementApp::new(config)?;
            print_json(&app.scan(today()).await?)?;
        }

        Commands::Query {
            query_type,
            product,
        } => {
            let app = ProcurementApp::new(config)?;
            let report = app.query(&query_type, product.as_deref(), today()).await?;
            print_json(&report)?;
        }

        Commands::Negotiate { product, quantity } => {
            let app = ProcurementApp::new(config)?;
            let report = app.negotiate(&product, quantity, &shutdown).await?;
            print_json(&report)?;
            if let Some(failure) = report.failure() {
                tracing::warn!("{}", failure);
            }
        }

        Commands::Replenish { concurrency } => {
            let app = ProcurementApp::new(config)?;
            let results = app.replenish(concurrency, today(), &shutdown).await?;
            print_json(&results)?;
        }
    }

    Ok(())
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
