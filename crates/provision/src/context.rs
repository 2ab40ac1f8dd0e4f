use stackpilot_config::SettingsResolver;

/// Per-item input handed to an adapter.
///
/// Carries only what adapters consume, never the whole request record.
/// All fields arrive resolved: the orchestrator has already applied
/// project-name fallbacks, domain derivation, and region/password
/// defaults before dispatch.
#[derive(Clone)]
pub struct ProvisionContext {
    pub project_name: String,
    pub plan_id: String,
    pub domain_name: String,
    pub region: String,
    pub db_password: String,
    pub settings: SettingsResolver,
}
