//! Tarifario Server
//!
//! Run with: cargo run --bin tarifario [-- path/to/config.toml]
//!
//! Without an argument the configuration is read from the default locations
//! (see `Config::load_default`), with `TARIFARIO_*` environment overrides.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tarifario::api::{serve, ApiConfig, AppState};
use tarifario::config::Config;
use tarifario::form::FormRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Config::load_with_env(&path)?,
        None => Config::load_default(),
    };

    tarifario::init_tracing(&config.logging);
    config.validate()?;

    tracing::info!("Starting Tarifario v{}", env!("CARGO_PKG_VERSION"));

    let catalog = Arc::new(tarifario::load_catalog(&config).context("loading tariff catalog")?);
    tracing::info!(
        items = catalog.len(),
        sections = catalog.section_count(),
        "Catalog ready"
    );

    let store = tarifario::build_store(&config)
        .await
        .context("initializing price store")?;
    tracing::info!(backend = store.backend(), "Price store ready");

    let registry = Arc::new(FormRegistry::new(
        catalog,
        store,
        config.form_config(),
        config.registry_config(),
    ));

    let api_config = ApiConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        cors_origins: config.server.cors_origins.clone(),
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        ..Default::default()
    };

    serve(AppState::new(registry, api_config.clone()), &api_config).await?;

    tracing::info!("Tarifario stopped");
    Ok(())
}
