//! # Tarifario
//!
//! A small web service for a dental clinic's price list: visitors browse the
//! tariff list, propose new prices, and each submission is appended as one
//! record to an external document store.
//!
//! ## Modules
//!
//! - [`catalog`]: The static baseline tariff list
//! - [`form`]: Price input handling, change-sets and the submission workflow
//! - [`store`]: Append-only price update stores (Firestore, file, memory)
//! - [`api`]: HTTP server with Axum
//! - [`page`]: Server-rendered price list page
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tarifario::catalog::PriceCatalog;
//! use tarifario::form::{FormConfig, PriceUpdateForm};
//! use tarifario::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Arc::new(PriceCatalog::embedded()?);
//!     let store = Arc::new(MemoryStore::new());
//!     let form = PriceUpdateForm::new(catalog, store.clone(), FormConfig::default());
//!
//!     form.record_edit("D0120", "₡25.000").await;
//!     let record = form.submit().await?;
//!
//!     println!("Stored {} update(s) as {}", record.updates.len(), record.id);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod form;
pub mod page;
pub mod store;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export top-level types for convenience
pub use catalog::{Amount, CatalogError, PriceCatalog, PricedItem};

pub use form::{
    compute_change_set, format_for_display, FormConfig, FormRegistry, NumberLocale,
    PriceUpdateForm, SubmissionError, SubmissionStatus, ValidationError,
};

pub use store::{
    FileStore, FirestoreStore, MemoryStore, PriceStore, PriceUpdate, PriceUpdateRecord,
    StoreError, StoredRecord,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig, StoreBackend};

/// Initialize tracing from the logging config.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("tarifario={},tower_http=info", config.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Load the catalog named by the config, or the embedded one
pub fn load_catalog(config: &Config) -> Result<PriceCatalog, CatalogError> {
    match &config.catalog.path {
        Some(path) => PriceCatalog::load(std::path::Path::new(path)),
        None => {
            let catalog = PriceCatalog::embedded()?;
            tracing::info!(items = catalog.len(), "Using embedded tariff catalog");
            Ok(catalog)
        }
    }
}

/// Build the store selected by the config
pub async fn build_store(config: &Config) -> Result<Arc<dyn PriceStore>, StoreError> {
    let store: Arc<dyn PriceStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory price store; submissions are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File => Arc::new(FileStore::open(&config.store.file_path).await?),
        StoreBackend::Firestore => {
            let firestore = config.firestore_config();
            tracing::info!(
                project = %firestore.project_id,
                collection = %firestore.collection,
                "Using Firestore price store"
            );
            Arc::new(FirestoreStore::new(firestore)?)
        }
    };
    Ok(store)
}
