//! Tariff Catalog
//!
//! The static baseline price list that every proposal is diffed against.
//!
//! - **types**: `PricedItem`, `PriceCatalog`, `Amount`
//! - **loader**: JSON dataset parsing and validation
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use tarifario::catalog::PriceCatalog;
//!
//! let catalog = PriceCatalog::embedded().unwrap();
//! let exam = catalog.get("D0120").unwrap();
//! assert_eq!(exam.name, "Examen");
//! ```

pub mod error;
pub mod loader;
pub mod types;

pub use error::{CatalogError, CatalogResult};
pub use loader::EMBEDDED_DATASET;
pub use types::{section_title, Amount, PriceCatalog, PricedItem, MAX_AMOUNT};
