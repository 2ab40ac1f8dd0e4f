use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════════════════
// ADAPTER OUTCOME
// ═══════════════════════════════════════════════════════════════════════════

/// Normalized result of one provisioning attempt against one provider.
///
/// Adapters never raise past their boundary: configuration gaps, rejected
/// domains, provider errors, and transport faults all land here as
/// `ok: false` with the failure in `error` (a plain message or the
/// provider's parsed error body). `status` is the upstream HTTP status,
/// `0` for transport faults, absent when no network call was made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionOutcome {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ProvisionOutcome {
    /// Successful provider call with an extracted resource id.
    pub fn success(
        provider: impl Into<String>,
        status: u16,
        resource_id: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            ok: true,
            provider: Some(provider.into()),
            status: Some(status),
            resource_id: Some(resource_id.into()),
            data: Some(data),
            error: None,
        }
    }

    /// Provider-attributed failure.
    pub fn failure(provider: impl Into<String>, status: Option<u16>, error: impl Into<Value>) -> Self {
        Self {
            ok: false,
            provider: Some(provider.into()),
            status,
            resource_id: None,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Provider-attributed failure carrying extra context, e.g. an
    /// unavailable-domain result that still names the domain searched.
    pub fn failure_with_data(
        provider: impl Into<String>,
        status: Option<u16>,
        error: impl Into<Value>,
        data: Value,
    ) -> Self {
        Self {
            data: Some(data),
            ..Self::failure(provider, status, error)
        }
    }

    /// Failure with no provider attribution, e.g. a missing adapter or a
    /// configuration gap reported before any provider was chosen.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            provider: None,
            status: None,
            resource_id: None,
            data: None,
            error: Some(Value::String(message.into())),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PER-ITEM BOOKKEEPING
// ═══════════════════════════════════════════════════════════════════════════

/// Latest provisioning attempt recorded for one order item.
///
/// Keyed by `item_index` in the parent request; a new attempt for the same
/// index overwrites the previous entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningEntry {
    pub item_index: usize,
    pub provider_id: String,
    pub service_id: String,
    pub plan_id: String,
    pub result: ProvisionOutcome,
    pub timestamp: DateTime<Utc>,
}

/// Success/failure counts for one provisioning invocation's target set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionSummary {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}
