use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ban::SignalType;
use crate::{RegistryError, Result};

/// Maximum length of a network name, in characters
pub const MAX_NAME_LEN: usize = 128;

/// Maximum length of a network description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 4096;

/// Maximum length of the connection info field, in characters
pub const MAX_CONNECTION_INFO_LEN: usize = 2048;

/// Maximum number of nodes a network may list
pub const MAX_NODES: usize = 256;

/// Audit label for a request without a user agent. Never an identity signal.
pub const UNKNOWN_USER_AGENT: &str = "unknown";

/// Lifecycle status of a network record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Awaiting review
    Pending,
    /// Publicly discoverable
    Approved,
    /// Hidden from discovery, retained for audit
    Rejected,
    /// Terminal; identity signals are banned
    Banned,
}

impl RecordStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Banned];

    /// Lower-case wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Banned => "banned",
        }
    }

    /// Returns true if records in this status appear in discovery
    #[must_use]
    pub const fn is_discoverable(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Returns true if no transition leaves this status
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Banned)
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single service instance participating in a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    /// Node identifier chosen by the operator
    pub node_id: Uuid,

    /// Display name
    pub name: String,

    /// Base URL the node is reachable at
    pub url: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,
}

/// A registered network, as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    /// Server-assigned identifier; immutable
    pub id: Uuid,

    /// Operator-supplied display name
    pub name: String,

    /// Operator-supplied description
    #[serde(default)]
    pub description: String,

    /// How to connect to the network (usually a URL)
    #[serde(default)]
    pub connection_info: String,

    /// Nodes participating in the network
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,

    /// SPKI PEM public key that signs modifications
    #[serde(default)]
    pub public_key: Option<String>,

    /// Current lifecycle status
    pub status: RecordStatus,

    /// Client IP captured at registration
    #[serde(default)]
    pub registrant_ip: Option<String>,

    /// Domain captured at registration
    #[serde(default)]
    pub registrant_domain: Option<String>,

    /// User agent captured at registration
    #[serde(default)]
    pub registrant_user_agent: Option<String>,

    /// Bumped on every successful write; used for compare-and-set
    pub revision: u64,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record last changed
    pub updated_at: DateTime<Utc>,
}

impl NetworkRecord {
    /// Returns true if the record may be returned by discovery
    #[must_use]
    pub const fn is_discoverable(&self) -> bool {
        self.status.is_discoverable()
    }

    /// Non-empty identity signals captured at registration.
    ///
    /// The [`UNKNOWN_USER_AGENT`] placeholder is skipped.
    #[must_use]
    pub fn signals(&self) -> Vec<(SignalType, &str)> {
        let user_agent = self
            .registrant_user_agent
            .as_deref()
            .filter(|ua| !ua.trim().eq_ignore_ascii_case(UNKNOWN_USER_AGENT));
        [
            (SignalType::Ip, self.registrant_ip.as_deref()),
            (SignalType::Domain, self.registrant_domain.as_deref()),
            (SignalType::UserAgent, user_agent),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.filter(|v| !v.is_empty()).map(|v| (kind, v)))
        .collect()
    }

    /// Public-safe projection: no key material, no registrant signals
    #[must_use]
    pub fn to_public(&self) -> PublicNetwork {
        PublicNetwork {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            connection_info: self.connection_info.clone(),
            nodes: self.nodes.clone(),
            revision: self.revision,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// What discovery callers get to see of a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicNetwork {
    /// Network identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Connection info
    pub connection_info: String,
    /// Participating nodes
    pub nodes: Vec<NodeEntry>,
    /// Current revision; signed modifications must name it
    pub revision: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

/// Check operator-supplied metadata against the field limits.
pub fn validate_metadata(
    name: &str,
    description: &str,
    connection_info: &str,
    nodes: &[NodeEntry],
) -> Result<()> {
    let name_len = name.trim().chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(RegistryError::InvalidInput(format!(
            "name must be 1..={MAX_NAME_LEN} characters"
        )));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(RegistryError::InvalidInput(format!(
            "description exceeds {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if connection_info.chars().count() > MAX_CONNECTION_INFO_LEN {
        return Err(RegistryError::InvalidInput(format!(
            "connection info exceeds {MAX_CONNECTION_INFO_LEN} characters"
        )));
    }
    if nodes.len() > MAX_NODES {
        return Err(RegistryError::InvalidInput(format!(
            "a network may list at most {MAX_NODES} nodes"
        )));
    }
    for node in nodes {
        url::Url::parse(&node.url).map_err(|e| {
            RegistryError::InvalidInput(format!("node {} has an invalid url: {e}", node.node_id))
        })?;
    }
    Ok(())
}
