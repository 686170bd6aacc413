//! Page Route
//!
//! - GET / - The rendered price list page

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::page;

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render_index(
        state.catalog(),
        state.registry.form_config(),
    ))
}
