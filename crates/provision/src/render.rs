use async_trait::async_trait;
use serde_json::{json, Value};
use stackpilot_config::SettingsResolver;
use stackpilot_types::ProvisionOutcome;
use tracing::debug;

use crate::{
    adapter::{normalize_outcome, value_text},
    naming::{slugify, truncate},
    ApiClient, ProvisionAdapter, ProvisionContext,
};

const RENDER_API_BASE: &str = "https://api.render.com/v1";

/// Web-service hosting via the Render API.
pub struct RenderAdapter {
    client: ApiClient,
}

impl RenderAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Owner account for the new service: an explicit RENDER_OWNER_ID
    /// wins, otherwise the owners endpoint is queried and a
    /// RENDER_OWNER_SLUG / RENDER_OWNER_NAME match (else the first owner)
    /// is taken. Empty means resolution failed.
    async fn resolve_owner_id(&self, token: &str, settings: &SettingsResolver) -> String {
        let explicit = settings.resolve("RENDER_OWNER_ID");
        if !explicit.is_empty() {
            return explicit;
        }

        let response = self
            .client
            .get_json(&format!("{RENDER_API_BASE}/owners"), Some(token), &[])
            .await;
        if !response.ok {
            return String::new();
        }

        let owners = collect_owners(&response.body);
        if owners.is_empty() {
            return String::new();
        }

        let preferred = {
            let slug = settings.resolve("RENDER_OWNER_SLUG");
            if slug.is_empty() {
                settings.resolve("RENDER_OWNER_NAME")
            } else {
                slug
            }
        };
        choose_owner(&owners, &preferred)
    }
}

#[async_trait]
impl ProvisionAdapter for RenderAdapter {
    fn provider(&self) -> &'static str {
        "render"
    }

    async fn provision(&self, context: &ProvisionContext) -> ProvisionOutcome {
        let token = context.settings.resolve("RENDER_API_KEY");
        let repo = context.settings.resolve("RENDER_SERVICE_REPO");
        let branch = context.settings.resolve_or("RENDER_SERVICE_BRANCH", "main");
        let region = context.settings.resolve_or("RENDER_SERVICE_REGION", "oregon");

        if token.is_empty() || repo.is_empty() {
            return ProvisionOutcome::rejected(
                "Render not configured. Required: RENDER_API_KEY, RENDER_SERVICE_REPO",
            );
        }

        let owner_id = self.resolve_owner_id(&token, &context.settings).await;
        if owner_id.is_empty() {
            return ProvisionOutcome::rejected(
                "Could not resolve Render owner. Set RENDER_OWNER_ID or ensure API key can access /v1/owners.",
            );
        }

        let service_name = truncate(&slugify(&format!("{}-web", context.project_name)), 40);
        debug!(service_name, owner_id, "Creating Render web service");
        let payload = json!({
            "type": "web_service",
            "name": service_name,
            "ownerId": owner_id,
            "repo": repo,
            "branch": branch,
            "autoDeploy": "yes",
            "serviceDetails": {
                "env": "node",
                "plan": render_plan(&context.plan_id),
                "region": region,
                "buildCommand": context.settings.resolve_or("RENDER_BUILD_COMMAND", "npm install"),
                "startCommand": context.settings.resolve_or("RENDER_START_COMMAND", "npm start"),
            },
        });

        let response = self
            .client
            .post_json(&format!("{RENDER_API_BASE}/services"), &token, &payload)
            .await;
        normalize_outcome("render", response)
    }
}

/// Map the catalog plan vocabulary onto Render's own plan names.
fn render_plan(plan_id: &str) -> &'static str {
    match plan_id {
        "pro" => "standard",
        "team" => "pro",
        _ => "starter",
    }
}

/// The owners endpoint has shipped several shapes: a bare array, an
/// object with `items` or `data` arrays, or a single owner object.
fn collect_owners(body: &Value) -> Vec<&Value> {
    match body {
        Value::Array(items) => items.iter().filter(|item| item.is_object()).collect(),
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("items") {
                items.iter().filter(|item| item.is_object()).collect()
            } else if let Some(Value::Array(items)) = map.get("data") {
                items.iter().filter(|item| item.is_object()).collect()
            } else if map.contains_key("id") {
                vec![body]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn choose_owner(owners: &[&Value], preferred: &str) -> String {
    if !preferred.is_empty() {
        let preferred = preferred.to_lowercase();
        for owner in owners {
            let slug = value_text(owner.get("slug")).to_lowercase();
            let name = value_text(owner.get("name")).to_lowercase();
            if preferred == slug || preferred == name {
                return value_text(owner.get("id"));
            }
        }
    }
    owners
        .first()
        .map(|owner| value_text(owner.get("id")))
        .unwrap_or_default()
}
