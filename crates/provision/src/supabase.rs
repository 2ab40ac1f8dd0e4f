use async_trait::async_trait;
use serde_json::json;
use stackpilot_types::ProvisionOutcome;

use crate::{
    adapter::normalize_outcome,
    naming::{slugify, truncate},
    ApiClient, ProvisionAdapter, ProvisionContext,
};

const SUPABASE_API_URL: &str = "https://api.supabase.com/v1/projects";

/// Managed Postgres projects via the Supabase management API.
pub struct SupabaseAdapter {
    client: ApiClient,
}

impl SupabaseAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProvisionAdapter for SupabaseAdapter {
    fn provider(&self) -> &'static str {
        "supabase"
    }

    async fn provision(&self, context: &ProvisionContext) -> ProvisionOutcome {
        let token = context.settings.resolve("SUPABASE_ACCESS_TOKEN");
        let org_id = context.settings.resolve("SUPABASE_ORG_ID");
        if token.is_empty() || org_id.is_empty() {
            return ProvisionOutcome::rejected(
                "Supabase not configured. Required: SUPABASE_ACCESS_TOKEN, SUPABASE_ORG_ID",
            );
        }
        if context.db_password.is_empty() {
            return ProvisionOutcome::rejected("Supabase requires dbPassword or SUPABASE_DB_PASS");
        }

        let region = if context.region.is_empty() {
            context.settings.resolve_or("SUPABASE_REGION", "us-east-1")
        } else {
            context.region.clone()
        };
        let payload = json!({
            "name": truncate(&slugify(&context.project_name), 30),
            "organization_id": org_id,
            "plan": supabase_plan(&context.plan_id),
            "region": region,
            "db_pass": context.db_password,
        });

        let response = self.client.post_json(SUPABASE_API_URL, &token, &payload).await;
        normalize_outcome("supabase", response)
    }
}

fn supabase_plan(plan_id: &str) -> &'static str {
    match plan_id {
        "pro" => "pro",
        "team" => "team",
        _ => "free",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_mapping_defaults_to_free() {
        assert_eq!(supabase_plan("free"), "free");
        assert_eq!(supabase_plan("pro"), "pro");
        assert_eq!(supabase_plan("team"), "team");
        assert_eq!(supabase_plan("enterprise"), "free");
    }
}
