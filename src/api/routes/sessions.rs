//! Form Session Routes
//!
//! Each visitor drives their own price update form through these endpoints.
//!
//! - POST /api/v1/sessions - Open a form session
//! - GET /api/v1/sessions/:id - Current form state
//! - DELETE /api/v1/sessions/:id - Close the session
//! - PUT /api/v1/sessions/:id/edits/:code - Record a proposed price
//! - GET /api/v1/sessions/:id/changes - Preview the change-set
//! - POST /api/v1/sessions/:id/submit - Submit the change-set

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::dto::{ChangeSetResponse, EditRequest, SessionResponse, SubmitResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::form::{PriceUpdateForm, SUCCESS_MESSAGE};

/// POST /api/v1/sessions
pub async fn open_session(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let (session_id, form) = state.registry.open().await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            form: form.snapshot().await,
        }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionResponse>> {
    let form = find_form(&state, &session_id).await?;

    Ok(Json(SessionResponse {
        session_id,
        form: form.snapshot().await,
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.registry.close(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session '{}' not found", session_id)))
    }
}

/// PUT /api/v1/sessions/:id/edits/:code
///
/// Only codes rendered from the catalog are accepted. When `seq` is sent, an
/// edit older than the last one applied to the same field is ignored.
pub async fn record_edit(
    State(state): State<Arc<AppState>>,
    Path((session_id, code)): Path<(Uuid, String)>,
    Json(req): Json<EditRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let form = find_form(&state, &session_id).await?;

    if !form.catalog().contains(&code) {
        return Err(ApiError::NotFound(format!("Item '{}' not found", code)));
    }

    match req.seq {
        Some(seq) => {
            if form.record_edit_ordered(&code, &req.raw, seq).await.is_none() {
                tracing::debug!(%session_id, %code, seq, "Ignoring out-of-order edit");
            }
        }
        None => {
            form.record_edit(&code, &req.raw).await;
        }
    }

    Ok(Json(SessionResponse {
        session_id,
        form: form.snapshot().await,
    }))
}

/// GET /api/v1/sessions/:id/changes
pub async fn preview_changes(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<ChangeSetResponse>> {
    let form = find_form(&state, &session_id).await?;
    let updates = form
        .change_set()
        .await
        .map_err(|e| ApiError::Validation(e.user_message()))?;

    Ok(Json(ChangeSetResponse {
        count: updates.len(),
        updates,
    }))
}

/// POST /api/v1/sessions/:id/submit
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let form = find_form(&state, &session_id).await?;
    let stored = form.submit().await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse::new(stored, SUCCESS_MESSAGE)),
    ))
}

async fn find_form(state: &AppState, session_id: &Uuid) -> ApiResult<Arc<PriceUpdateForm>> {
    state
        .registry
        .get(session_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session '{}' not found", session_id)))
}
