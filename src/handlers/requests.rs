use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::auth::{require_role, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{
    parse_json_body, parse_new_request, parse_provision, parse_status_update,
};

pub async fn list_requests(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let requests = state.ledger.list().await?;
    Ok(Json(json!({"ok": true, "requests": requests})))
}

pub async fn create_request(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let body = parse_json_body(&body).map_err(ApiError::Validation)?;
    let input = parse_new_request(&body).map_err(ApiError::Validation)?;
    let record = state.ledger.create(input).await?;
    Ok(Json(json!({"ok": true, "request": record})))
}

pub async fn provision_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    require_role(&headers, &state.settings, Role::Admin)?;
    let body = parse_json_body(&body).map_err(ApiError::Validation)?;
    let payload = parse_provision(&body).map_err(ApiError::Validation)?;
    let report = state
        .orchestrator
        .provision(&payload.request_id, payload.options)
        .await?;
    Ok(Json(
        json!({"ok": true, "request": report.request, "summary": report.summary}),
    ))
}

pub async fn update_request_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    require_role(&headers, &state.settings, Role::Admin)?;
    let body = parse_json_body(&body).map_err(ApiError::Validation)?;
    let payload = parse_status_update(&body).map_err(ApiError::Validation)?;
    let record = state
        .ledger
        .update_status(&payload.request_id, payload.status, &payload.reason)
        .await?;
    Ok(Json(json!({"ok": true, "request": record})))
}
