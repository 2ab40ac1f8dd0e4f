use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use stackpilot_config::SettingsResolver;

use crate::state::AppState;

pub async fn providers(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"ok": true, "catalog": &*state.catalog}))
}

pub async fn provider_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"ok": true, "providers": health_entries(&state.settings)}))
}

/// Per-provider readiness, derived purely from which credentials resolve.
/// Never calls out to any provider.
#[derive(Debug, Serialize)]
struct ProviderHealth {
    id: &'static str,
    configured: bool,
    required: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

fn health_entries(settings: &SettingsResolver) -> Vec<ProviderHealth> {
    let render_has_owner = settings.is_set("RENDER_OWNER_ID");
    let render_auto_discover = settings.is_set("RENDER_API_KEY") && !render_has_owner;
    vec![
        ProviderHealth {
            id: "render",
            configured: settings.is_set("RENDER_API_KEY") && settings.is_set("RENDER_SERVICE_REPO"),
            required: vec!["RENDER_API_KEY", "RENDER_SERVICE_REPO"],
            note: Some(if render_auto_discover || render_has_owner {
                "RENDER_OWNER_ID optional".to_string()
            } else {
                String::new()
            }),
        },
        ProviderHealth {
            id: "dynadot",
            configured: settings.is_set("DYNADOT_API_KEY"),
            required: vec!["DYNADOT_API_KEY"],
            note: Some(
                "Set DYNADOT_AUTO_REGISTER=true to place real registration orders.".to_string(),
            ),
        },
        ProviderHealth {
            id: "supabase",
            configured: settings.is_set("SUPABASE_ACCESS_TOKEN")
                && settings.is_set("SUPABASE_ORG_ID"),
            required: vec!["SUPABASE_ACCESS_TOKEN", "SUPABASE_ORG_ID"],
            note: None,
        },
        ProviderHealth {
            id: "neon",
            configured: settings.is_set("NEON_API_KEY"),
            required: vec!["NEON_API_KEY"],
            note: None,
        },
    ]
}
