use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of registrant identity signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalType {
    /// Client IP address
    Ip,
    /// Registrant domain
    Domain,
    /// HTTP user agent
    UserAgent,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ip => write!(f, "ip"),
            Self::Domain => write!(f, "domain"),
            Self::UserAgent => write!(f, "userAgent"),
        }
    }
}

/// A permanently banned identity signal.
///
/// Keyed by `(signal_type, signal_value)`; inserting a duplicate is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanEntry {
    /// Which signal this entry matches
    pub signal_type: SignalType,

    /// Normalized signal value
    pub signal_value: String,

    /// When the ban was recorded
    pub banned_at: DateTime<Utc>,

    /// Why the ban was recorded
    #[serde(default)]
    pub reason: String,

    /// Network whose ban produced this entry
    #[serde(default)]
    pub source_record: Option<Uuid>,
}

impl BanEntry {
    /// Store key for this entry
    #[must_use]
    pub fn key(&self) -> (SignalType, String) {
        (self.signal_type, self.signal_value.clone())
    }
}
