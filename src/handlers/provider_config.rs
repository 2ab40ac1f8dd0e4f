use std::collections::{BTreeMap, HashMap};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use stackpilot_config::mask_secret;

use crate::auth::{require_role, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::parse_json_body;

/// Stored provider overrides, masked for display.
pub async fn get_provider_config(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_role(&headers, &state.settings, Role::Admin)?;
    let masked = state.settings.overrides().masked();
    let saved_keys: Vec<String> = masked.keys().cloned().collect();
    Ok(Json(
        json!({"ok": true, "values": masked, "savedKeys": saved_keys}),
    ))
}

/// Merge operator-supplied values into the override store. Scalars are
/// coerced to text; null and structured values clear their key.
pub async fn update_provider_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, ApiError> {
    require_role(&headers, &state.settings, Role::Admin)?;
    let body = parse_json_body(&body).map_err(ApiError::Validation)?;
    let object = body
        .as_object()
        .ok_or_else(|| ApiError::Validation("Request body must be a JSON object".to_string()))?;
    let values = match object.get("values") {
        Some(Value::Object(map)) => map,
        _ => return Err(ApiError::Validation("values must be an object".to_string())),
    };

    let updates: HashMap<String, String> = values
        .iter()
        .map(|(key, value)| (key.clone(), scalar_text(value)))
        .collect();
    let saved = state.settings.overrides().apply(&updates)?;

    let masked: BTreeMap<String, String> = saved
        .iter()
        .map(|(key, value)| (key.clone(), mask_secret(value)))
        .collect();
    let saved_keys: Vec<String> = masked.keys().cloned().collect();
    Ok(Json(json!({
        "ok": true,
        "savedKeys": saved_keys,
        "values": masked,
        "message": "Provider settings saved.",
    })))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}
