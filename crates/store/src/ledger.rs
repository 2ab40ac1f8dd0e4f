use chrono::Utc;
use regex::Regex;
use stackpilot_catalog::CatalogIndex;
use stackpilot_types::{
    NewServiceRequest, ProvisioningEntry, RequestStatus, ServiceRequest, ServiceRequestItem,
};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{RequestStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Request not found")]
    NotFound,

    #[error("items must be a non-empty array")]
    EmptyItems,

    #[error("Unknown item: {provider_id}/{service_id}/{plan_id} ({billing_cycle})")]
    UnknownItem {
        provider_id: String,
        service_id: String,
        plan_id: String,
        billing_cycle: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The request ledger owns every mutation of the stored collection.
///
/// Each operation is one load-mutate-save critical section under a single
/// write lock, so concurrent calls cannot overwrite each other's changes
/// and request-id allocation cannot collide. Reads skip the lock.
pub struct RequestLedger {
    store: Arc<dyn RequestStore>,
    write_lock: Mutex<()>,
}

impl RequestLedger {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Price and persist a new order.
    ///
    /// Every item must resolve against the catalog; one unresolvable item
    /// fails the whole submission with nothing written. Stored items keep
    /// the caller's id casing alongside the resolved names and price.
    pub async fn create(&self, input: NewServiceRequest) -> Result<ServiceRequest, LedgerError> {
        if input.items.is_empty() {
            return Err(LedgerError::EmptyItems);
        }

        let index = CatalogIndex::builtin();
        let mut items = Vec::with_capacity(input.items.len());
        for raw in &input.items {
            let plan = index
                .lookup(&raw.provider_id, &raw.service_id, &raw.plan_id, &raw.billing_cycle)
                .ok_or_else(|| LedgerError::UnknownItem {
                    provider_id: raw.provider_id.clone(),
                    service_id: raw.service_id.clone(),
                    plan_id: raw.plan_id.clone(),
                    billing_cycle: raw.billing_cycle.clone(),
                })?;
            items.push(ServiceRequestItem {
                provider_id: raw.provider_id.clone(),
                provider_name: plan.provider_name.clone(),
                service_id: raw.service_id.clone(),
                service_name: plan.service_name.clone(),
                plan_id: raw.plan_id.clone(),
                plan_label: plan.plan_label.clone(),
                billing_cycle: raw.billing_cycle.clone(),
                unit_price: plan.price,
            });
        }
        let total = items
            .iter()
            .map(|item| item.unit_price)
            .sum::<rust_decimal::Decimal>()
            .round_dp(2);

        let _guard = self.write_lock.lock().await;
        let mut requests = self.store.load_all().await?;
        let request_id = next_request_id(&requests);
        let record = ServiceRequest::new(
            request_id.clone(),
            input.customer_name.trim().to_string(),
            input.email.trim().to_string(),
            input.project_name.trim().to_string(),
            input.notes.trim().to_string(),
            items,
            total,
            Utc::now(),
        );
        requests.insert(0, record.clone());
        self.store.save_all(&requests).await?;

        info!(request_id = %request_id, total = %total, items = record.items.len(), "Created service request");
        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<ServiceRequest>, LedgerError> {
        Ok(self.store.load_all().await?)
    }

    pub async fn find(&self, request_id: &str) -> Result<ServiceRequest, LedgerError> {
        self.store
            .load_all()
            .await?
            .into_iter()
            .find(|request| request.request_id == request_id)
            .ok_or(LedgerError::NotFound)
    }

    /// Apply a manual or derived status change. A transition to the current
    /// status writes nothing and leaves `updatedAt` untouched.
    pub async fn update_status(
        &self,
        request_id: &str,
        status: RequestStatus,
        reason: &str,
    ) -> Result<ServiceRequest, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut requests = self.store.load_all().await?;
        let record = requests
            .iter_mut()
            .find(|request| request.request_id == request_id)
            .ok_or(LedgerError::NotFound)?;

        if record.apply_status(status, reason) {
            let updated = record.clone();
            self.store.save_all(&requests).await?;
            info!(request_id = %request_id, status = %status, reason, "Updated request status");
            Ok(updated)
        } else {
            debug!(request_id = %request_id, status = %status, "Status unchanged, skipping write");
            Ok(record.clone())
        }
    }

    /// Commit one provisioning run: merge the run's entries into the
    /// freshly-loaded record (overwrite by index, untouched indices kept),
    /// re-derive the aggregate status, and persist.
    pub async fn record_run(
        &self,
        request_id: &str,
        entries: Vec<ProvisioningEntry>,
        reason: &str,
    ) -> Result<ServiceRequest, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut requests = self.store.load_all().await?;
        let record = requests
            .iter_mut()
            .find(|request| request.request_id == request_id)
            .ok_or(LedgerError::NotFound)?;

        for entry in entries {
            record.record_provision_entry(entry);
        }
        let next_status = record.derived_provision_status();
        record.apply_status(next_status, reason);
        let updated = record.clone();
        self.store.save_all(&requests).await?;

        info!(request_id = %request_id, status = %next_status, "Recorded provisioning run");
        Ok(updated)
    }
}

static REQUEST_ID_PATTERN: OnceLock<Regex> = OnceLock::new();

fn request_id_pattern() -> &'static Regex {
    REQUEST_ID_PATTERN.get_or_init(|| Regex::new(r"^SRV-(\d{8})-(\d{4})$").expect("static pattern"))
}

/// Allocate the next request id: `SRV-YYYYMMDD-NNNN` with the sequence
/// reset daily and computed as max-existing-for-today + 1, so deleted
/// requests never cause reuse.
fn next_request_id(existing: &[ServiceRequest]) -> String {
    let date_part = Utc::now().format("%Y%m%d").to_string();
    let mut max_seq = 0u32;
    for request in existing {
        if let Some(captures) = request_id_pattern().captures(&request.request_id) {
            if &captures[1] == date_part.as_str() {
                if let Ok(seq) = captures[2].parse::<u32>() {
                    max_seq = max_seq.max(seq);
                }
            }
        }
    }
    format!("SRV-{}-{:04}", date_part, max_seq + 1)
}
