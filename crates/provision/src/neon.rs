use async_trait::async_trait;
use serde_json::{json, Value};
use stackpilot_types::ProvisionOutcome;

use crate::{
    adapter::normalize_outcome,
    naming::{slugify, truncate},
    ApiClient, ProvisionAdapter, ProvisionContext,
};

const NEON_API_URL: &str = "https://console.neon.tech/api/v2/projects";

/// Serverless Postgres projects via the Neon console API.
pub struct NeonAdapter {
    client: ApiClient,
}

impl NeonAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProvisionAdapter for NeonAdapter {
    fn provider(&self) -> &'static str {
        "neon"
    }

    async fn provision(&self, context: &ProvisionContext) -> ProvisionOutcome {
        let token = context.settings.resolve("NEON_API_KEY");
        if token.is_empty() {
            return ProvisionOutcome::rejected("Neon not configured. Required: NEON_API_KEY");
        }

        let region_fallback = if context.region.is_empty() {
            "aws-us-east-2".to_string()
        } else {
            context.region.clone()
        };
        let mut project = json!({
            "name": truncate(&slugify(&context.project_name), 40),
            "region_id": context.settings.resolve_or("NEON_REGION_ID", &region_fallback),
            "pg_version": context.settings.resolve_u32("NEON_PG_VERSION", 16),
        });
        let org_id = context.settings.resolve("NEON_ORG_ID");
        if !org_id.is_empty() {
            project["org_id"] = Value::String(org_id);
        }

        let payload = json!({ "project": project });
        let response = self.client.post_json(NEON_API_URL, &token, &payload).await;
        normalize_outcome("neon", response)
    }
}
