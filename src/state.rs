use stackpilot_catalog::{builtin, Catalog};
use stackpilot_config::{ServerSettings, SettingsResolver};
use stackpilot_orchestrator::ProvisionOrchestrator;
use stackpilot_provision::{AdapterRegistry, ApiClient};
use stackpilot_store::{JsonFileStore, RequestLedger, RequestStore};
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<RequestLedger>,
    pub orchestrator: Arc<ProvisionOrchestrator>,
    pub settings: SettingsResolver,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    /// Production wiring: file-backed store, stock adapter registry.
    pub fn build(settings: SettingsResolver, server: &ServerSettings) -> Self {
        let store: Arc<dyn RequestStore> = Arc::new(JsonFileStore::new(server.requests_file()));
        Self::with_parts(store, AdapterRegistry::builtin(ApiClient::new()), settings)
    }

    /// Wiring with injectable store and registry, used by tests to swap
    /// in memory-backed stores and stub adapters.
    pub fn with_parts(
        store: Arc<dyn RequestStore>,
        registry: AdapterRegistry,
        settings: SettingsResolver,
    ) -> Self {
        let ledger = Arc::new(RequestLedger::new(store));
        let orchestrator = Arc::new(ProvisionOrchestrator::new(
            ledger.clone(),
            registry,
            settings.clone(),
        ));
        Self {
            ledger,
            orchestrator,
            settings,
            catalog: Arc::new(builtin()),
        }
    }
}
