// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SafeLife store status check.
//!
//! Connects with the configured credentials, reports the ingestion sync
//! markers and the number of registered webhooks, then releases the
//! connection.

use anyhow::Context;
use safelife_store::{config::Config, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        project = %config.project_id,
        backend = ?config.backend,
        "Starting SafeLife store check"
    );

    let store = Store::connect(&config)
        .await
        .context("Failed to connect to document store")?;

    let commit = store
        .get_last_checked_commit()
        .await
        .context("Failed to read commit marker")?;
    let etag = store.get_etag().await.context("Failed to read ETag marker")?;
    let webhooks = store
        .list_webhooks()
        .await
        .context("Failed to list webhooks")?;

    tracing::info!(
        last_commit = commit.as_deref().unwrap_or("<none>"),
        etag = etag.as_deref().unwrap_or("<none>"),
        webhooks = webhooks.len(),
        "Store status"
    );

    store.close().await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("safelife_store=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
