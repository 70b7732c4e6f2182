use chrono::{DateTime, Utc};
use json_patch::Patch;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::moderation::ModerationAction;

/// What happened to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    /// Registration
    Create,
    /// Signed modification
    Update,
    /// Moderation: approve
    Approve,
    /// Moderation: reject
    Reject,
    /// Moderation: ban
    Ban,
    /// Moderation: reopen
    Reopen,
}

impl From<ModerationAction> for RecordAction {
    fn from(action: ModerationAction) -> Self {
        match action {
            ModerationAction::Approve => Self::Approve,
            ModerationAction::Reject => Self::Reject,
            ModerationAction::Ban => Self::Ban,
            ModerationAction::Reopen => Self::Reopen,
        }
    }
}

/// Transport details of the request behind an audit entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetail {
    /// Resolved client IP
    pub ip_address: Option<String>,
    /// Client user agent
    pub user_agent: Option<String>,
}

/// Append-only history entry for a network record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Record the entry belongs to
    pub record_id: Uuid,

    /// Record revision after the change; unique per record
    pub version: u64,

    /// What happened
    pub action: RecordAction,

    /// Who did it (`registrant`, `network-key`, or `admin:<name>`)
    pub actor: String,

    /// When it happened
    pub timestamp: DateTime<Utc>,

    /// `sha256:<hex>` of the record before the change
    #[serde(default)]
    pub hash_before: Option<String>,

    /// `sha256:<hex>` of the record after the change
    pub hash_after: String,

    /// RFC 6902 patch from the previous record JSON (`{}` on create)
    pub patch: Patch,

    /// Request that caused the change, when there was one
    #[serde(default)]
    pub request: Option<RequestDetail>,
}
