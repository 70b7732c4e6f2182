use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single-use proof-of-work challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeToken {
    /// Token identifier quoted back at registration
    pub id: Uuid,

    /// Random nonce the solution is hashed with (32 lowercase hex chars)
    pub puzzle: String,

    /// Required number of leading zero bits
    pub difficulty: u8,

    /// Issue time
    pub issued_at: DateTime<Utc>,

    /// Hard expiry, checked lazily at verification
    pub expires_at: DateTime<Utc>,
}

impl ChallengeToken {
    /// Returns true once `now` has reached the expiry
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        let token = ChallengeToken {
            id: Uuid::new_v4(),
            puzzle: "00".repeat(16),
            difficulty: 4,
            issued_at: now,
            expires_at: now + Duration::seconds(60),
        };
        assert!(!token.is_expired(now));
        assert!(token.is_expired(token.expires_at));
        assert!(token.is_expired(now + Duration::minutes(5)));
    }
}
