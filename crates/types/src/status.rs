use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a service request.
///
/// There is no enforced transition graph: operators and the provisioning
/// workflow both need free movement (e.g. `on_hold` from any state). The
/// parser is the only write barrier; unknown values never reach a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Submitted,
    Reviewing,
    Approved,
    Provisioning,
    Active,
    PartiallyActive,
    ProvisionFailed,
    OnHold,
    Cancelled,
}

impl RequestStatus {
    /// Every member, in declaration order.
    pub const ALL: [RequestStatus; 9] = [
        RequestStatus::Submitted,
        RequestStatus::Reviewing,
        RequestStatus::Approved,
        RequestStatus::Provisioning,
        RequestStatus::Active,
        RequestStatus::PartiallyActive,
        RequestStatus::ProvisionFailed,
        RequestStatus::OnHold,
        RequestStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Submitted => "submitted",
            RequestStatus::Reviewing => "reviewing",
            RequestStatus::Approved => "approved",
            RequestStatus::Provisioning => "provisioning",
            RequestStatus::Active => "active",
            RequestStatus::PartiallyActive => "partially_active",
            RequestStatus::ProvisionFailed => "provision_failed",
            RequestStatus::OnHold => "on_hold",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// Member names sorted alphabetically, for operator-facing messages.
    pub fn sorted_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown request status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    /// Parse a caller-supplied status, trimming and lowercasing first.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|status| status.as_str() == normalized)
            .copied()
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}
