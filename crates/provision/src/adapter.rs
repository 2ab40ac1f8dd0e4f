use async_trait::async_trait;
use serde_json::Value;
use stackpilot_types::ProvisionOutcome;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::{
    ApiClient, ApiOutcome, DynadotAdapter, NeonAdapter, ProvisionContext, RenderAdapter,
    SupabaseAdapter,
};

/// One provider integration.
///
/// Implementations must not fail past this boundary: configuration gaps,
/// provider rejections, and transport faults all come back as an
/// `ok: false` outcome.
#[async_trait]
pub trait ProvisionAdapter: Send + Sync {
    fn provider(&self) -> &'static str;
    async fn provision(&self, context: &ProvisionContext) -> ProvisionOutcome;
}

// ═══════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════

/// Dispatch table from `(providerId, serviceId)` to an adapter.
///
/// Keys are matched after trimming and lowercasing, and several provider
/// ids may alias one adapter (domain registrars all share one
/// integration).
pub struct AdapterRegistry {
    adapters: HashMap<(String, String), Arc<dyn ProvisionAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// The stock wiring: four integrations, with `namecheap` and
    /// `cloudflare` aliased onto the domain adapter.
    pub fn builtin(client: ApiClient) -> Self {
        let mut registry = Self::new();
        registry.register(
            "render",
            "managed-web-hosting",
            Arc::new(RenderAdapter::new(client.clone())),
        );
        let domains: Arc<dyn ProvisionAdapter> = Arc::new(DynadotAdapter::new(client.clone()));
        for provider in ["dynadot", "namecheap", "cloudflare"] {
            registry.register(provider, "domain-registration", domains.clone());
        }
        registry.register(
            "supabase",
            "managed-postgres",
            Arc::new(SupabaseAdapter::new(client.clone())),
        );
        registry.register(
            "neon",
            "serverless-postgres",
            Arc::new(NeonAdapter::new(client)),
        );
        registry
    }

    pub fn register(
        &mut self,
        provider_id: &str,
        service_id: &str,
        adapter: Arc<dyn ProvisionAdapter>,
    ) {
        self.adapters
            .insert(registry_key(provider_id, service_id), adapter);
    }

    pub fn find(&self, provider_id: &str, service_id: &str) -> Option<&dyn ProvisionAdapter> {
        self.adapters
            .get(&registry_key(provider_id, service_id))
            .map(Arc::as_ref)
    }

    /// Dispatch one item; an unmatched pair yields the deterministic
    /// no-adapter failure instead of an error.
    pub async fn provision(
        &self,
        provider_id: &str,
        service_id: &str,
        context: &ProvisionContext,
    ) -> ProvisionOutcome {
        match self.find(provider_id, service_id) {
            Some(adapter) => {
                debug!(provider = adapter.provider(), provider_id, service_id, "Dispatching to adapter");
                adapter.provision(context).await
            }
            None => ProvisionOutcome::rejected(format!(
                "No provisioning adapter for {provider_id}/{service_id}"
            )),
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn registry_key(provider_id: &str, service_id: &str) -> (String, String) {
    (
        provider_id.trim().to_lowercase(),
        service_id.trim().to_lowercase(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// RESPONSE NORMALIZATION
// ═══════════════════════════════════════════════════════════════════════════

/// Fold a raw provider call into the adapter contract: a 2xx body becomes
/// a success carrying the extracted resource id, anything else a
/// provider-attributed failure carrying the upstream body.
pub(crate) fn normalize_outcome(provider: &'static str, outcome: ApiOutcome) -> ProvisionOutcome {
    if outcome.ok {
        let resource_id = extract_resource_id(provider, &outcome.body);
        ProvisionOutcome::success(provider, outcome.status, resource_id, outcome.body)
    } else {
        ProvisionOutcome::failure(provider, Some(outcome.status), outcome.body)
    }
}

/// Pull the provider's primary identifier out of a create response. Each
/// provider shapes this differently; missing ids come back empty rather
/// than failing the call.
pub(crate) fn extract_resource_id(provider: &str, payload: &Value) -> String {
    let Some(map) = payload.as_object() else {
        return String::new();
    };
    match provider {
        "dynadot" => value_text(map.get("domain").or_else(|| map.get("id"))),
        "render" => value_text(map.get("id")),
        "supabase" => value_text(map.get("id").or_else(|| map.get("ref"))),
        "neon" => map
            .get("project")
            .and_then(Value::as_object)
            .map(|project| value_text(project.get("id")))
            .unwrap_or_default(),
        _ => value_text(map.get("id")),
    }
}

/// String form of a scalar JSON value; anything else is empty.
pub(crate) fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stackpilot_config::{OverrideStore, SettingsResolver};

    struct StubAdapter;

    #[async_trait]
    impl ProvisionAdapter for StubAdapter {
        fn provider(&self) -> &'static str {
            "stub"
        }

        async fn provision(&self, _context: &ProvisionContext) -> ProvisionOutcome {
            ProvisionOutcome::success("stub", 200, "stub-1", json!({}))
        }
    }

    fn make_context() -> ProvisionContext {
        let resolver = SettingsResolver::with_snapshot(HashMap::new(), OverrideStore::memory());
        ProvisionContext {
            project_name: "island breeze".to_string(),
            plan_id: "starter".to_string(),
            domain_name: "islandbreeze.com".to_string(),
            region: "us-east-1".to_string(),
            db_password: "hunter2hunter2".to_string(),
            settings: resolver,
        }
    }

    #[tokio::test]
    async fn registry_matches_after_trim_and_lowercase() {
        let mut registry = AdapterRegistry::new();
        registry.register("Stub", "Some-Service", Arc::new(StubAdapter));

        let outcome = registry
            .provision(" stub ", "some-service", &make_context())
            .await;
        assert!(outcome.ok);
        assert_eq!(outcome.resource_id.as_deref(), Some("stub-1"));
    }

    #[tokio::test]
    async fn unmatched_pair_yields_no_adapter_failure() {
        let registry = AdapterRegistry::new();
        let outcome = registry
            .provision("acme", "quantum-hosting", &make_context())
            .await;
        assert!(!outcome.ok);
        assert_eq!(
            outcome.error,
            Some(json!("No provisioning adapter for acme/quantum-hosting"))
        );
        assert!(outcome.provider.is_none());
    }

    #[test]
    fn builtin_registry_covers_aliases() {
        let registry = AdapterRegistry::builtin(ApiClient::new());
        assert!(registry.find("render", "managed-web-hosting").is_some());
        assert!(registry.find("namecheap", "domain-registration").is_some());
        assert!(registry.find("cloudflare", "domain-registration").is_some());
        assert!(registry.find("neon", "serverless-postgres").is_some());
        assert!(registry.find("render", "domain-registration").is_none());
    }

    #[test]
    fn resource_ids_follow_provider_shapes() {
        assert_eq!(
            extract_resource_id("render", &json!({"id": "srv-42"})),
            "srv-42"
        );
        assert_eq!(
            extract_resource_id("supabase", &json!({"ref": "abcd1234"})),
            "abcd1234"
        );
        assert_eq!(
            extract_resource_id("neon", &json!({"project": {"id": "proj-7"}})),
            "proj-7"
        );
        assert_eq!(
            extract_resource_id("dynadot", &json!({"domain": "example.com"})),
            "example.com"
        );
        assert_eq!(extract_resource_id("render", &json!([1, 2])), "");
        assert_eq!(extract_resource_id("neon", &json!({"project": []})), "");
    }

    #[test]
    fn normalize_maps_both_sides_of_the_contract() {
        let success = normalize_outcome(
            "render",
            ApiOutcome {
                ok: true,
                status: 201,
                body: json!({"id": "srv-9"}),
            },
        );
        assert!(success.ok);
        assert_eq!(success.status, Some(201));
        assert_eq!(success.resource_id.as_deref(), Some("srv-9"));

        let failure = normalize_outcome(
            "render",
            ApiOutcome {
                ok: false,
                status: 402,
                body: json!({"message": "payment required"}),
            },
        );
        assert!(!failure.ok);
        assert_eq!(failure.status, Some(402));
        assert_eq!(failure.error, Some(json!({"message": "payment required"})));
    }
}
