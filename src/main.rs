mod api;
mod config;
mod entrypoints;
mod error;
mod exchange_rates;
mod models;
mod payments;
mod state;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::api::FrankfurterClient;
use crate::exchange_rates::ReportInput;
use crate::payments::format_amount;
use crate::state::AppContext;

#[derive(Parser, Debug)]
#[command(name = "fxrates", version, about = "Paid exchange rate agent backed by Frankfurter")]
struct Cli {
    /// Path to a TOML config file (defaults to $FXRATES_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Address to bind, overrides config and environment
    #[arg(long, global = true)]
    bind: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print every entrypoint with its price
    Entrypoints,
    /// Run the market report once and print it as JSON
    Report {
        #[arg(long)]
        base: Option<String>,
    },
    /// Write the effective configuration to a TOML file
    InitConfig {
        #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
        out: PathBuf,
        /// Replace the file if it already exists
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Entrypoints => {
            print_entrypoints(&config);
            Ok(())
        }
        Command::Report { base } => print_report(&config, base).await,
        Command::InitConfig { out, force } => {
            if out.exists() && !force {
                anyhow::bail!("{} already exists, pass --force to overwrite", out.display());
            }
            config::save_config(&config, &out)?;
            println!("Wrote {}", out.display());
            Ok(())
        }
    }
}

async fn serve(config: config::Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let ctx = AppContext::from_config(config);

    tracing::info!(
        upstream = %ctx.config.upstream.base_url,
        payments = ctx.payments_enabled(),
        analytics = ctx.tracker.is_some(),
        "starting {} v{}",
        ctx.config.agent.name,
        ctx.config.agent.version
    );

    let app = api::router(ctx);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("shutdown signal received");
}

fn print_entrypoints(config: &config::Config) {
    let pricing = payments::PriceTable::from_config(&config.pricing);
    let enabled = config.payments.enabled;

    println!(
        "{:<24} {:>10} {:>10}  {}",
        "ENTRYPOINT", "PRICE", "USDC", "DESCRIPTION"
    );
    for entry in pricing.entries() {
        let price = if enabled { entry.price } else { 0 };
        println!(
            "{:<24} {:>10} {:>10}  {}",
            entry.key,
            price,
            format_amount(price, 6),
            entry.description
        );
    }
    if !enabled {
        println!("\nPayments are disabled; every entrypoint is free.");
    }
}

async fn print_report(config: &config::Config, base: Option<String>) -> Result<()> {
    let params = ReportInput { base }.validate()?;
    let client = FrankfurterClient::new(config.upstream.base_url.clone());
    tracing::debug!(upstream = client.base_url(), base = %params.base, "running report");
    let report = exchange_rates::report(&client, params).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
