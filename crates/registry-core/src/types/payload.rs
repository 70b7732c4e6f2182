use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::network::NodeEntry;

/// A registration submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    /// SPKI PEM key that will sign later modifications
    pub public_key: String,

    /// Challenge the solution answers
    pub challenge_token_id: Uuid,

    /// Proof-of-work solution
    pub solution: String,

    /// Display name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Connection info
    #[serde(default)]
    pub connection_info: String,

    /// Initial node list
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

/// Signed modification of a network record.
///
/// The canonical serialization of this struct is what gets signed. Absent
/// fields are omitted, never serialized as `null`, so `None` means "leave
/// unchanged".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationPayload {
    /// Record being modified
    pub record_id: Uuid,

    /// Revision the signer based the change on
    pub revision: u64,

    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New connection info
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_info: Option<String>,

    /// Replacement node list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeEntry>>,

    /// Replacement public key (rotation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl ModificationPayload {
    /// An empty modification of `record_id` at `revision`
    #[must_use]
    pub const fn new(record_id: Uuid, revision: u64) -> Self {
        Self {
            record_id,
            revision,
            name: None,
            description: None,
            connection_info: None,
            nodes: None,
            public_key: None,
        }
    }

    /// Returns true if no field is being changed
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.connection_info.is_none()
            && self.nodes.is_none()
            && self.public_key.is_none()
    }
}
