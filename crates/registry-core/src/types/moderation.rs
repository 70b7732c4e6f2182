use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::RegistryError;

/// Admin moderation action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationAction {
    /// Make the network discoverable
    Approve,
    /// Hide the network, keeping it for audit
    Reject,
    /// Terminal ban of the network and its registrant signals
    Ban,
    /// Send a rejected network back to review
    Reopen,
}

impl ModerationAction {
    /// All actions
    pub const ALL: [Self; 4] = [Self::Approve, Self::Reject, Self::Ban, Self::Reopen];

    /// Lower-case wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Ban => "ban",
            Self::Reopen => "reopen",
        }
    }
}

impl std::fmt::Display for ModerationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationAction {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "ban" | "blacklist" => Ok(Self::Ban),
            "reopen" => Ok(Self::Reopen),
            other => Err(RegistryError::InvalidInput(format!(
                "unknown moderation action: {other}"
            ))),
        }
    }
}
