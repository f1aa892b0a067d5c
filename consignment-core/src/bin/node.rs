//! Consignment node binary
//!
//! Reads one JSON invocation per line from stdin,
//! `{"function": "...", "args": ["..."]}`, and writes one JSON response per
//! line to stdout.

use anyhow::Context;
use consignment_core::{actor::spawn_contract_actor, Config, Contract, Metrics};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::from_env().context("Failed to load config from environment")?,
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        backend = ?config.store,
        "Starting consignment node"
    );

    let store = config.open_store().context("Failed to open ledger store")?;
    let metrics = Metrics::new()?;
    let contract = Contract::new(store, &config, metrics.clone());
    let handle = spawn_contract_actor(contract, config.actor.mailbox_capacity);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        };

        let Some(line) = line else {
            break;
        };
        let Some(response) = handle.invoke_line(&line).await else {
            continue;
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    handle.shutdown().await?;
    tracing::debug!(metrics = %metrics.render()?, "Final metrics");
    tracing::info!("Shutting down consignment node");
    Ok(())
}
