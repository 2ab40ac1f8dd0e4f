use chrono::Utc;
use stackpilot_config::SettingsResolver;
use stackpilot_provision::{slugify, AdapterRegistry, ProvisionContext};
use stackpilot_store::{LedgerError, RequestLedger};
use stackpilot_types::{ProvisionSummary, ProvisioningEntry, ServiceRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Caller-supplied knobs for one provisioning run. Empty strings count as
/// absent; every absent field falls back to a derived or configured
/// default before any adapter runs.
#[derive(Debug, Clone, Default)]
pub struct ProvisionOptions {
    pub domain_name: Option<String>,
    pub region: Option<String>,
    pub db_password: Option<String>,
    pub retry_failed: bool,
}

/// Result of one run: the re-persisted request plus counts covering this
/// invocation's target set only.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub request: ServiceRequest,
    pub summary: ProvisionSummary,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Request has no service items")]
    NoServiceItems,

    #[error("No failed provisioning items available to retry")]
    NothingToRetry,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Drives provisioning runs end to end: picks the target items, resolves
/// shared inputs, dispatches each item to its adapter, and commits the
/// merged outcome through the ledger.
///
/// Adapter calls happen outside the ledger's write lock; only the final
/// commit re-loads and merges under it, so a slow provider call never
/// blocks unrelated reads or writes.
pub struct ProvisionOrchestrator {
    ledger: Arc<RequestLedger>,
    registry: AdapterRegistry,
    settings: SettingsResolver,
}

impl ProvisionOrchestrator {
    pub fn new(
        ledger: Arc<RequestLedger>,
        registry: AdapterRegistry,
        settings: SettingsResolver,
    ) -> Self {
        Self {
            ledger,
            registry,
            settings,
        }
    }

    pub async fn provision(
        &self,
        request_id: &str,
        options: ProvisionOptions,
    ) -> Result<ProvisionReport, OrchestratorError> {
        let record = self.ledger.find(request_id).await?;
        if record.items.is_empty() {
            return Err(OrchestratorError::NoServiceItems);
        }

        let project_name = {
            let trimmed = record.project_name.trim();
            if trimmed.is_empty() {
                "island-project".to_string()
            } else {
                trimmed.to_string()
            }
        };
        let domain_name = non_empty(options.domain_name)
            .unwrap_or_else(|| format!("{}.com", slugify(&project_name)));
        let region = non_empty(options.region)
            .unwrap_or_else(|| self.settings.resolve_or("DEFAULT_REGION", "us-east-1"));
        let db_password = non_empty(options.db_password).unwrap_or_else(|| {
            let configured = self.settings.resolve("SUPABASE_DB_PASS");
            if configured.is_empty() {
                self.settings.resolve("DEFAULT_DB_PASSWORD")
            } else {
                configured
            }
        });

        let target_indices: Vec<usize> = if options.retry_failed {
            let failed = record.failed_indices();
            if failed.is_empty() {
                return Err(OrchestratorError::NothingToRetry);
            }
            failed
        } else {
            (0..record.items.len()).collect()
        };
        info!(
            request_id,
            targets = target_indices.len(),
            retry = options.retry_failed,
            "Starting provisioning run"
        );

        let mut entries = Vec::with_capacity(target_indices.len());
        let mut success_count = 0usize;
        for index in target_indices {
            let item = &record.items[index];
            let provider_id = item.provider_id.trim().to_lowercase();
            let service_id = item.service_id.trim().to_lowercase();
            let plan_id = item.plan_id.trim().to_lowercase();

            let context = ProvisionContext {
                project_name: project_name.clone(),
                plan_id: plan_id.clone(),
                domain_name: domain_name.clone(),
                region: region.clone(),
                db_password: db_password.clone(),
                settings: self.settings.clone(),
            };
            let result = self
                .registry
                .provision(&provider_id, &service_id, &context)
                .await;
            if result.ok {
                success_count += 1;
                info!(request_id, item = index, provider = %provider_id, "Item provisioned");
            } else {
                warn!(request_id, item = index, provider = %provider_id, "Item provisioning failed");
            }

            entries.push(ProvisioningEntry {
                item_index: index,
                provider_id,
                service_id,
                plan_id,
                result,
                timestamp: Utc::now(),
            });
        }

        let total = entries.len();
        let reason = if options.retry_failed {
            "retry failed provisioning"
        } else {
            "provisioning run"
        };
        let request = self.ledger.record_run(request_id, entries, reason).await?;
        let summary = ProvisionSummary {
            success: success_count,
            failed: total - success_count,
            total,
        };
        info!(
            request_id,
            status = %request.status,
            success = summary.success,
            failed = summary.failed,
            "Provisioning run complete"
        );
        Ok(ProvisionReport { request, summary })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
