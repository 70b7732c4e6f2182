//! Persistence boundary.
//!
//! The registry holds no state of its own between requests. Everything lives
//! behind these traits, and every operation that must not race
//! (token consumption, ban insertion, status changes) is a single
//! conditional write on the store side:
//!
//! - [`ChallengeStore::take`] removes a token atomically; only one caller gets it.
//! - [`BanStore::insert_if_absent`] is keyed by `(signal type, value)`.
//! - [`NetworkStore::update_if_revision`] is a compare-and-set on `revision`.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use registry_core::{
    AuditEntry, BanEntry, ChallengeToken, NetworkRecord, RecordStatus, SignalType,
};

use crate::{RegistryError, Result};

pub use memory::MemoryStore;

/// A network record together with its insertion position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNetwork {
    /// Monotonic insertion sequence, assigned by the store.
    pub sequence: u64,
    /// The record itself.
    pub record: NetworkRecord,
}

/// Network record collection, keyed by id.
#[async_trait]
pub trait NetworkStore: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the id is taken.
    async fn insert(&self, record: NetworkRecord) -> Result<()>;

    /// Fetch a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<NetworkRecord>>;

    /// Replace the record only if the stored revision equals `expected_revision`.
    ///
    /// Returns `false` when the revision moved on; `NotFound` if the record is gone.
    async fn update_if_revision(&self, record: NetworkRecord, expected_revision: u64)
        -> Result<bool>;

    /// Records in insertion order, optionally filtered by status, starting
    /// strictly after sequence `after`.
    async fn list(
        &self,
        status: Option<RecordStatus>,
        after: Option<u64>,
    ) -> Result<Vec<StoredNetwork>>;
}

/// Ban entry collection, keyed by `(signal type, value)`.
#[async_trait]
pub trait BanStore: Send + Sync {
    /// Insert unless the key exists. Returns `true` if inserted.
    async fn insert_if_absent(&self, entry: BanEntry) -> Result<bool>;

    /// Whether a ban exists for the exact signal.
    async fn contains(&self, signal: SignalType, value: &str) -> Result<bool>;

    /// All ban entries.
    async fn list(&self) -> Result<Vec<BanEntry>>;
}

/// Challenge token collection, keyed by id, with TTL semantics.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Store a freshly issued token.
    async fn insert(&self, token: ChallengeToken) -> Result<()>;

    /// Peek at a token without consuming it.
    async fn get(&self, id: Uuid) -> Result<Option<ChallengeToken>>;

    /// Atomically remove and return a token.
    async fn take(&self, id: Uuid) -> Result<Option<ChallengeToken>>;

    /// Drop tokens that expired before `now`. Returns how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Append-only audit trail, keyed by `(record id, version)`.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an entry. Fails with `Conflict` if the version already exists.
    async fn append(&self, entry: AuditEntry) -> Result<()>;

    /// Entries for a record, by ascending version.
    async fn list(&self, record_id: Uuid) -> Result<Vec<AuditEntry>>;
}

/// Run a store call with a hard deadline.
///
/// A call that outlives `limit` fails with a retryable
/// [`RegistryError::StoreUnavailable`] instead of hanging the request.
pub async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if let Ok(result) = tokio::time::timeout(limit, fut).await {
        result
    } else {
        let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        warn!(op, timeout_ms, "store call timed out");
        Err(RegistryError::StoreUnavailable(format!(
            "{op} timed out after {timeout_ms}ms"
        )))
    }
}
