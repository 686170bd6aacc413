//! Dataset loading
//!
//! Accepts `{ section: [{codigo, servicio, monto_crc}, ...], ... }`, either
//! bare or wrapped in a single named top-level key.

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

use super::error::{CatalogError, CatalogResult};
use super::types::{PriceCatalog, PricedItem};

/// The tariff list shipped with the binary
pub const EMBEDDED_DATASET: &str = include_str!("../../data/tarifas.json");

#[derive(Deserialize)]
#[serde(untagged)]
enum Dataset {
    Flat(IndexMap<String, Vec<PricedItem>>),
    Wrapped(IndexMap<String, IndexMap<String, Vec<PricedItem>>>),
}

impl PriceCatalog {
    /// Parse a catalog from a JSON document
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let dataset: Dataset = serde_json::from_str(json)?;

        let sections = match dataset {
            Dataset::Flat(sections) => sections,
            Dataset::Wrapped(mut wrapped) => {
                if wrapped.len() != 1 {
                    return Err(CatalogError::Parse(format!(
                        "expected a single top-level key, found {}",
                        wrapped.len()
                    )));
                }
                match wrapped.pop() {
                    Some((_, sections)) => sections,
                    None => IndexMap::new(),
                }
            }
        };

        Self::from_sections(sections)
    }

    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let catalog = Self::from_json(&content)?;
        tracing::info!(
            path = %path.display(),
            items = catalog.len(),
            sections = catalog.section_count(),
            "Loaded tariff catalog"
        );
        Ok(catalog)
    }

    /// The catalog compiled into the binary
    pub fn embedded() -> CatalogResult<Self> {
        Self::from_json(EMBEDDED_DATASET)
    }
}
