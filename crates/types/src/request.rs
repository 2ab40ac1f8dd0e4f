use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ProvisioningEntry, RequestStatus};

// ═══════════════════════════════════════════════════════════════════════════
// ORDER ITEMS
// ═══════════════════════════════════════════════════════════════════════════

/// One priced line of a service request.
///
/// The id fields keep the caller's original casing; names, label, and price
/// are the catalog resolution captured at creation time. Catalog price
/// changes never retroactively affect an existing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestItem {
    pub provider_id: String,
    pub provider_name: String,
    pub service_id: String,
    pub service_name: String,
    pub plan_id: String,
    pub plan_label: String,
    pub billing_cycle: String,
    pub unit_price: Decimal,
}

/// Unpriced item selection as submitted by the customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequestItem {
    pub provider_id: String,
    pub service_id: String,
    pub plan_id: String,
    pub billing_cycle: String,
}

/// Validated order-submission input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewServiceRequest {
    pub customer_name: String,
    pub email: String,
    pub project_name: String,
    pub notes: String,
    pub items: Vec<NewRequestItem>,
}

// ═══════════════════════════════════════════════════════════════════════════
// AGGREGATE ROOT
// ═══════════════════════════════════════════════════════════════════════════

/// One entry of the newest-first status audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

/// A customer's priced order, tracked through provisioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub request_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: String,
    pub email: String,
    pub project_name: String,
    #[serde(default)]
    pub notes: String,
    pub items: Vec<ServiceRequestItem>,
    pub total: Decimal,
    pub status: RequestStatus,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    /// Latest attempt per item index. Stored and serialized as an array
    /// sorted ascending by index; in memory an ordered map.
    #[serde(default, with = "entry_map")]
    pub provisioning: BTreeMap<usize, ProvisioningEntry>,
}

impl ServiceRequest {
    /// Assemble a freshly-submitted request in `submitted` status with the
    /// seed audit entry.
    pub fn new(
        request_id: String,
        customer_name: String,
        email: String,
        project_name: String,
        notes: String,
        items: Vec<ServiceRequestItem>,
        total: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            request_id,
            created_at,
            updated_at: created_at,
            customer_name,
            email,
            project_name,
            notes,
            items,
            total,
            status: RequestStatus::Submitted,
            status_history: vec![StatusChange {
                status: RequestStatus::Submitted,
                timestamp: created_at,
                reason: "request created".to_string(),
            }],
            provisioning: BTreeMap::new(),
        }
    }

    /// Apply a status change through the transition authority.
    ///
    /// A transition to the current status is a no-op: nothing is recorded
    /// and `updated_at` is untouched. Returns whether the status actually
    /// changed, so callers can skip persisting a no-op.
    pub fn apply_status(&mut self, status: RequestStatus, reason: &str) -> bool {
        if self.status == status {
            return false;
        }
        let timestamp = Utc::now();
        self.status = status;
        self.updated_at = timestamp;
        self.status_history.insert(
            0,
            StatusChange {
                status,
                timestamp,
                reason: reason.to_string(),
            },
        );
        true
    }

    /// Record the latest attempt for an item index, overwriting any prior
    /// entry at that index. Out-of-range indices are dropped to keep the
    /// mapping inside `[0, items.len())`.
    pub fn record_provision_entry(&mut self, entry: ProvisioningEntry) {
        if entry.item_index >= self.items.len() {
            return;
        }
        self.provisioning.insert(entry.item_index, entry);
    }

    /// Item indices whose latest attempt failed.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.provisioning
            .iter()
            .filter(|(index, entry)| **index < self.items.len() && !entry.result.ok)
            .map(|(index, _)| *index)
            .collect()
    }

    /// Whether every item index has at least one recorded attempt.
    pub fn fully_attempted(&self) -> bool {
        (0..self.items.len()).all(|index| self.provisioning.contains_key(&index))
    }

    /// Aggregate status implied by the item-level outcomes.
    ///
    /// Until every index has an entry the request stays `provisioning`.
    /// Once complete: all ok is `active`, none ok is `provision_failed`,
    /// anything in between is `partially_active`.
    pub fn derived_provision_status(&self) -> RequestStatus {
        if !self.fully_attempted() {
            return RequestStatus::Provisioning;
        }
        let ok_count = (0..self.items.len())
            .filter(|index| {
                self.provisioning
                    .get(index)
                    .map(|entry| entry.result.ok)
                    .unwrap_or(false)
            })
            .count();
        if ok_count == self.items.len() {
            RequestStatus::Active
        } else if ok_count == 0 {
            RequestStatus::ProvisionFailed
        } else {
            RequestStatus::PartiallyActive
        }
    }
}

/// Wire format for the provisioning mapping: an array of entries sorted
/// ascending by item index, each carrying its own `itemIndex`.
mod entry_map {
    use super::ProvisioningEntry;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(
        map: &BTreeMap<usize, ProvisioningEntry>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for entry in map.values() {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<usize, ProvisioningEntry>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<ProvisioningEntry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.item_index, entry))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProvisionOutcome;
    use serde_json::json;

    fn make_test_request(item_count: usize) -> ServiceRequest {
        let items = (0..item_count)
            .map(|i| ServiceRequestItem {
                provider_id: format!("provider-{i}"),
                provider_name: format!("Provider {i}"),
                service_id: "svc".to_string(),
                service_name: "Service".to_string(),
                plan_id: "starter".to_string(),
                plan_label: "Starter".to_string(),
                billing_cycle: "monthly".to_string(),
                unit_price: Decimal::from(7u32),
            })
            .collect::<Vec<_>>();
        let total = items.iter().map(|i| i.unit_price).sum::<Decimal>().round_dp(2);
        ServiceRequest::new(
            "SRV-20260801-0001".to_string(),
            "Casey Rivera".to_string(),
            "casey@example.com".to_string(),
            "island breeze".to_string(),
            String::new(),
            items,
            total,
            Utc::now(),
        )
    }

    fn make_entry(index: usize, ok: bool) -> ProvisioningEntry {
        let result = if ok {
            ProvisionOutcome::success("render", 201, format!("res-{index}"), json!({}))
        } else {
            ProvisionOutcome::failure("render", Some(500), "boom")
        };
        ProvisioningEntry {
            item_index: index,
            provider_id: "render".to_string(),
            service_id: "managed-web-hosting".to_string(),
            plan_id: "starter".to_string(),
            result,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_request_seeds_submitted_history() {
        let request = make_test_request(2);
        assert_eq!(request.status, RequestStatus::Submitted);
        assert_eq!(request.status_history.len(), 1);
        assert_eq!(request.status_history[0].reason, "request created");
        assert_eq!(request.updated_at, request.created_at);
    }

    #[test]
    fn apply_status_noop_leaves_everything_untouched() {
        let mut request = make_test_request(1);
        let updated_at = request.updated_at;
        assert!(!request.apply_status(RequestStatus::Submitted, "manual update"));
        assert_eq!(request.status_history.len(), 1);
        assert_eq!(request.updated_at, updated_at);
    }

    #[test]
    fn apply_status_prepends_history_and_stamps() {
        let mut request = make_test_request(1);
        assert!(request.apply_status(RequestStatus::OnHold, "manual update"));
        assert_eq!(request.status, RequestStatus::OnHold);
        assert_eq!(request.status_history.len(), 2);
        assert_eq!(request.status_history[0].status, RequestStatus::OnHold);
        assert_eq!(request.status_history[0].reason, "manual update");
        assert!(request.updated_at >= request.created_at);
    }

    #[test]
    fn entries_overwrite_by_index() {
        let mut request = make_test_request(2);
        request.record_provision_entry(make_entry(0, false));
        request.record_provision_entry(make_entry(0, true));
        assert_eq!(request.provisioning.len(), 1);
        assert!(request.provisioning[&0].result.ok);
    }

    #[test]
    fn out_of_range_entries_are_dropped() {
        let mut request = make_test_request(1);
        request.record_provision_entry(make_entry(5, true));
        assert!(request.provisioning.is_empty());
    }

    #[test]
    fn derivation_stays_provisioning_until_all_attempted() {
        let mut request = make_test_request(3);
        request.record_provision_entry(make_entry(0, true));
        request.record_provision_entry(make_entry(2, false));
        assert_eq!(request.derived_provision_status(), RequestStatus::Provisioning);
        request.record_provision_entry(make_entry(1, true));
        assert_eq!(
            request.derived_provision_status(),
            RequestStatus::PartiallyActive
        );
    }

    #[test]
    fn derivation_covers_all_and_none() {
        let mut request = make_test_request(2);
        request.record_provision_entry(make_entry(0, true));
        request.record_provision_entry(make_entry(1, true));
        assert_eq!(request.derived_provision_status(), RequestStatus::Active);

        let mut failed = make_test_request(2);
        failed.record_provision_entry(make_entry(0, false));
        failed.record_provision_entry(make_entry(1, false));
        assert_eq!(
            failed.derived_provision_status(),
            RequestStatus::ProvisionFailed
        );
    }

    #[test]
    fn failed_indices_lists_only_failures() {
        let mut request = make_test_request(3);
        request.record_provision_entry(make_entry(0, true));
        request.record_provision_entry(make_entry(1, false));
        request.record_provision_entry(make_entry(2, false));
        assert_eq!(request.failed_indices(), vec![1, 2]);
    }

    #[test]
    fn provisioning_round_trips_as_sorted_array() {
        let mut request = make_test_request(3);
        request.record_provision_entry(make_entry(2, true));
        request.record_provision_entry(make_entry(0, false));
        let value = serde_json::to_value(&request).unwrap();
        let entries = value["provisioning"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["itemIndex"], json!(0));
        assert_eq!(entries[1]["itemIndex"], json!(2));

        let back: ServiceRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back.provisioning.len(), 2);
        assert!(back.provisioning[&2].result.ok);
    }
}
