//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{section_title, Amount, PriceCatalog};
use crate::form::{format_amount, FormSnapshot, NumberLocale};
use crate::store::{PriceUpdate, StoredRecord};

// ============================================
// CATALOG DTOs
// ============================================

/// Full tariff list
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub locale: String,
    pub item_count: usize,
    pub sections: Vec<SectionDto>,
}

#[derive(Debug, Serialize)]
pub struct SectionDto {
    /// Dataset key, e.g. "01_diagnostico"
    pub key: String,
    /// Display title, e.g. "diagnostico"
    pub title: String,
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Serialize)]
pub struct ItemDto {
    pub code: String,
    pub name: String,
    pub base_price: Amount,
    pub base_price_display: String,
}

impl CatalogResponse {
    pub fn from_catalog(catalog: &PriceCatalog, locale: NumberLocale) -> Self {
        let sections = catalog
            .sections()
            .map(|(key, items)| SectionDto {
                key: key.to_string(),
                title: section_title(key),
                items: items
                    .iter()
                    .map(|item| ItemDto {
                        code: item.code.clone(),
                        name: item.name.clone(),
                        base_price: item.base_price,
                        base_price_display: format_amount(item.base_price, locale),
                    })
                    .collect(),
            })
            .collect();

        Self {
            locale: locale.tag().to_string(),
            item_count: catalog.len(),
            sections,
        }
    }
}

// ============================================
// FORMAT DTOs
// ============================================

/// Raw text typed into a price field
#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    pub raw: String,
}

#[derive(Debug, Serialize)]
pub struct FormatResponse {
    /// Digits that would be stored
    pub digits: String,
    /// Grouped for display
    pub display: String,
}

// ============================================
// SESSION DTOs
// ============================================

/// New value for one price field
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub raw: String,
    /// Per-field edit counter; older edits than the last applied one are dropped
    #[serde(default)]
    pub seq: Option<u64>,
}

/// Session id plus the current form state
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub form: FormSnapshot,
}

/// Updates a submission would append
#[derive(Debug, Serialize)]
pub struct ChangeSetResponse {
    pub count: usize,
    pub updates: Vec<PriceUpdate>,
}

/// Result of a successful submission
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: String,
    pub updates: Vec<PriceUpdate>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl SubmitResponse {
    pub fn new(record: StoredRecord, message: impl Into<String>) -> Self {
        Self {
            id: record.id,
            updates: record.updates,
            timestamp: record.submitted_at,
            message: message.into(),
        }
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub catalog_items: usize,
    pub sessions: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
