//! Catalog Routes
//!
//! - GET /api/v1/catalog - The tariff list with display prices
//! - POST /api/v1/format - Preview how a raw price input is stored and shown

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{CatalogResponse, FormatRequest, FormatResponse};
use crate::api::state::AppState;
use crate::form::{format_for_display, strip_non_digits};

/// GET /api/v1/catalog
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    Json(CatalogResponse::from_catalog(state.catalog(), state.locale()))
}

/// POST /api/v1/format
pub async fn format_price(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FormatRequest>,
) -> Json<FormatResponse> {
    Json(FormatResponse {
        digits: strip_non_digits(&req.raw),
        display: format_for_display(&req.raw, state.locale()),
    })
}
