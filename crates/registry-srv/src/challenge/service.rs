//! Challenge issue and verification against the challenge store.

use chrono::Utc;
use ring::rand::SystemRandom;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use registry_core::ChallengeToken;

use super::pow;
use crate::config::ChallengeConfig;
use crate::store::{bounded, ChallengeStore};
use crate::{RegistryError, Result};

/// Result of checking a solution against a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// Solution accepted; the token has been consumed.
    Accepted,
    /// No such token, or it was already consumed.
    Unknown,
    /// Token exists but its expiry has passed.
    Expired,
    /// Token is live but the solution does not satisfy it. Not consumed.
    WrongSolution,
}

impl ChallengeOutcome {
    /// Map to the registration error a caller should see.
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::Accepted => Ok(()),
            Self::Unknown | Self::Expired => Err(RegistryError::ChallengeExpired),
            Self::WrongSolution => Err(RegistryError::ChallengeInvalid),
        }
    }
}

/// Issues proof-of-work challenges and verifies solutions.
pub struct ChallengeService {
    store: Arc<dyn ChallengeStore>,
    settings: ChallengeConfig,
    timeout: Duration,
    rng: SystemRandom,
}

impl ChallengeService {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn ChallengeStore>,
        settings: ChallengeConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            settings,
            timeout,
            rng: SystemRandom::new(),
        }
    }

    /// Issue and persist a new token at the configured difficulty.
    pub async fn issue(&self) -> Result<ChallengeToken> {
        let issued_at = Utc::now();
        let expires_at = chrono::Duration::from_std(self.settings.ttl())
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| {
                RegistryError::Config(format!(
                    "challenge ttl of {}s is out of range",
                    self.settings.ttl_secs
                ))
            })?;
        let token = ChallengeToken {
            id: Uuid::new_v4(),
            puzzle: pow::generate_puzzle(&self.rng)?,
            difficulty: self.settings.effective_difficulty(),
            issued_at,
            expires_at,
        };

        bounded(self.timeout, "challenge.insert", self.store.insert(token.clone())).await?;

        debug!(
            token = %token.id,
            difficulty = token.difficulty,
            expires_at = %token.expires_at,
            "issued challenge"
        );
        Ok(token)
    }

    /// Check `solution` against token `token_id`, consuming it on success.
    ///
    /// Store failures propagate; every other rejection is an outcome.
    pub async fn check(&self, token_id: Uuid, solution: &str) -> Result<ChallengeOutcome> {
        let Some(token) = bounded(self.timeout, "challenge.get", self.store.get(token_id)).await?
        else {
            return Ok(ChallengeOutcome::Unknown);
        };

        if token.is_expired(Utc::now()) {
            // Lazy expiry: nothing sweeps in the background.
            bounded(self.timeout, "challenge.take", self.store.take(token_id)).await?;
            return Ok(ChallengeOutcome::Expired);
        }

        if !pow::satisfies(&token.puzzle, solution, token.difficulty) {
            return Ok(ChallengeOutcome::WrongSolution);
        }

        // Only the caller that actually removes the token wins.
        match bounded(self.timeout, "challenge.take", self.store.take(token_id)).await? {
            Some(_) => Ok(ChallengeOutcome::Accepted),
            None => Ok(ChallengeOutcome::Unknown),
        }
    }

    /// `true` exactly once per valid token and solution.
    ///
    /// Fails closed: a store error is logged and treated as a rejection.
    pub async fn verify(&self, token_id: Uuid, solution: &str) -> bool {
        match self.check(token_id, solution).await {
            Ok(outcome) => outcome == ChallengeOutcome::Accepted,
            Err(e) => {
                warn!(token = %token_id, error = %e, "challenge verification failed closed");
                false
            }
        }
    }

    /// Drop expired tokens. Optional; verification never depends on it.
    pub async fn purge_expired(&self) -> Result<usize> {
        bounded(self.timeout, "challenge.purge", self.store.purge_expired(Utc::now())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service(store: Arc<MemoryStore>, difficulty: u8, ttl_secs: u64) -> ChallengeService {
        ChallengeService::new(
            store,
            ChallengeConfig {
                base_difficulty: difficulty,
                difficulty_shift: 0,
                ttl_secs,
            },
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn valid_solution_verifies_exactly_once() {
        let svc = service(Arc::new(MemoryStore::new()), 6, 60);
        let token = svc.issue().await.unwrap();
        let solution = pow::solve(&token.puzzle, token.difficulty);

        assert!(svc.verify(token.id, &solution).await);
        assert!(!svc.verify(token.id, &solution).await);
    }

    #[tokio::test]
    async fn wrong_solution_does_not_consume_token() {
        let svc = service(Arc::new(MemoryStore::new()), 12, 60);
        let token = svc.issue().await.unwrap();
        let solution = pow::solve(&token.puzzle, token.difficulty);

        // Find a string that fails the predicate.
        let wrong = (0u64..)
            .map(|n| format!("x{n}"))
            .find(|s| !pow::satisfies(&token.puzzle, s, token.difficulty))
            .unwrap();

        assert_eq!(
            svc.check(token.id, &wrong).await.unwrap(),
            ChallengeOutcome::WrongSolution
        );
        assert_eq!(
            svc.check(token.id, &solution).await.unwrap(),
            ChallengeOutcome::Accepted
        );
    }

    #[tokio::test]
    async fn expired_token_is_rejected_and_removed() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), 1, 60);
        let now = Utc::now();
        let token = ChallengeToken {
            id: Uuid::new_v4(),
            puzzle: "00".repeat(16),
            difficulty: 1,
            issued_at: now - chrono::Duration::minutes(10),
            expires_at: now - chrono::Duration::minutes(5),
        };
        ChallengeStore::insert(&*store, token.clone()).await.unwrap();
        let solution = pow::solve(&token.puzzle, 1);

        assert_eq!(
            svc.check(token.id, &solution).await.unwrap(),
            ChallengeOutcome::Expired
        );
        assert_eq!(store.challenge_count(), 0);
    }

    #[tokio::test]
    async fn unknown_token() {
        let svc = service(Arc::new(MemoryStore::new()), 1, 60);
        assert_eq!(
            svc.check(Uuid::new_v4(), "0").await.unwrap(),
            ChallengeOutcome::Unknown
        );
        assert!(matches!(
            ChallengeOutcome::Unknown.into_result(),
            Err(RegistryError::ChallengeExpired)
        ));
        assert!(matches!(
            ChallengeOutcome::WrongSolution.into_result(),
            Err(RegistryError::ChallengeInvalid)
        ));
    }

    #[tokio::test]
    async fn concurrent_solvers_get_one_success() {
        let svc = Arc::new(service(Arc::new(MemoryStore::new()), 4, 60));
        let token = svc.issue().await.unwrap();
        let solution = pow::solve(&token.puzzle, token.difficulty);

        let token_id = token.id;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            let solution = solution.clone();
            handles.push(tokio::spawn(async move { svc.verify(token_id, &solution).await }));
        }
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn issued_tokens_use_configured_difficulty_and_ttl() {
        let svc = service(Arc::new(MemoryStore::new()), 9, 120);
        let token = svc.issue().await.unwrap();
        assert_eq!(token.difficulty, 9);
        assert_eq!((token.expires_at - token.issued_at).num_seconds(), 120);
    }

    #[tokio::test]
    async fn unrepresentable_expiry_is_a_config_error() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), 1, 10_000_000_000_000);
        let err = svc.issue().await.unwrap_err();
        assert_eq!(err.reason_code(), "config");
        assert_eq!(store.challenge_count(), 0);
    }

    #[tokio::test]
    async fn slow_store_fails_closed() {
        let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(200)));
        let svc = ChallengeService::new(
            store,
            ChallengeConfig::default(),
            Duration::from_millis(10),
        );
        assert!(svc.issue().await.unwrap_err().is_retryable());
        assert!(!svc.verify(Uuid::new_v4(), "0").await);
    }
}
