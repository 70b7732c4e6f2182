//! In-memory store backed by `DashMap`.
//!
//! Each conditional write goes through a single shard lock, which gives the
//! same per-key atomicity a document store's conditional update would.
//! Suitable for tests and single-process deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use registry_core::{
    AuditEntry, BanEntry, ChallengeToken, NetworkRecord, RecordStatus, SignalType,
};

use super::{AuditStore, BanStore, ChallengeStore, NetworkStore, StoredNetwork};
use crate::{RegistryError, Result};

/// All four registry collections in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    networks: DashMap<Uuid, StoredNetwork>,
    next_sequence: AtomicU64,
    bans: DashMap<(SignalType, String), BanEntry>,
    challenges: DashMap<Uuid, ChallengeToken>,
    audits: DashMap<Uuid, Vec<AuditEntry>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that sleeps before every call (for timeout testing).
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    /// Number of challenge tokens currently held.
    #[must_use]
    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl NetworkStore for MemoryStore {
    async fn insert(&self, record: NetworkRecord) -> Result<()> {
        self.delay().await;
        match self.networks.entry(record.id) {
            Entry::Occupied(_) => Err(RegistryError::Conflict(format!(
                "network {} already exists",
                record.id
            ))),
            Entry::Vacant(slot) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredNetwork { sequence, record });
                Ok(())
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<NetworkRecord>> {
        self.delay().await;
        Ok(self.networks.get(&id).map(|stored| stored.record.clone()))
    }

    async fn update_if_revision(
        &self,
        record: NetworkRecord,
        expected_revision: u64,
    ) -> Result<bool> {
        self.delay().await;
        let Some(mut stored) = self.networks.get_mut(&record.id) else {
            return Err(RegistryError::not_found(format!("network {}", record.id)));
        };
        if stored.record.revision != expected_revision {
            return Ok(false);
        }
        stored.record = record;
        Ok(true)
    }

    async fn list(
        &self,
        status: Option<RecordStatus>,
        after: Option<u64>,
    ) -> Result<Vec<StoredNetwork>> {
        self.delay().await;
        let mut matched: Vec<StoredNetwork> = self
            .networks
            .iter()
            .filter(|stored| status.map_or(true, |s| stored.record.status == s))
            .filter(|stored| after.map_or(true, |a| stored.sequence > a))
            .map(|stored| stored.value().clone())
            .collect();
        matched.sort_by_key(|stored| stored.sequence);
        Ok(matched)
    }
}

#[async_trait]
impl BanStore for MemoryStore {
    async fn insert_if_absent(&self, entry: BanEntry) -> Result<bool> {
        self.delay().await;
        match self.bans.entry(entry.key()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(true)
            }
        }
    }

    async fn contains(&self, signal: SignalType, value: &str) -> Result<bool> {
        self.delay().await;
        Ok(self.bans.contains_key(&(signal, value.to_string())))
    }

    async fn list(&self) -> Result<Vec<BanEntry>> {
        self.delay().await;
        let mut entries: Vec<BanEntry> = self.bans.iter().map(|e| e.value().clone()).collect();
        entries.sort_by(|a, b| a.banned_at.cmp(&b.banned_at).then_with(|| a.key().cmp(&b.key())));
        Ok(entries)
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn insert(&self, token: ChallengeToken) -> Result<()> {
        self.delay().await;
        self.challenges.insert(token.id, token);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChallengeToken>> {
        self.delay().await;
        Ok(self.challenges.get(&id).map(|t| t.clone()))
    }

    async fn take(&self, id: Uuid) -> Result<Option<ChallengeToken>> {
        self.delay().await;
        Ok(self.challenges.remove(&id).map(|(_, token)| token))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        self.delay().await;
        let before = self.challenges.len();
        self.challenges.retain(|_, token| !token.is_expired(now));
        Ok(before.saturating_sub(self.challenges.len()))
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        self.delay().await;
        let mut trail = self.audits.entry(entry.record_id).or_default();
        if trail.iter().any(|existing| existing.version == entry.version) {
            return Err(RegistryError::Conflict(format!(
                "audit version {} already recorded for network {}",
                entry.version, entry.record_id
            )));
        }
        trail.push(entry);
        trail.sort_by_key(|e| e.version);
        Ok(())
    }

    async fn list(&self, record_id: Uuid) -> Result<Vec<AuditEntry>> {
        self.delay().await;
        Ok(self
            .audits
            .get(&record_id)
            .map(|trail| trail.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_core::RecordAction;

    fn record(status: RecordStatus) -> NetworkRecord {
        let now = Utc::now();
        NetworkRecord {
            id: Uuid::new_v4(),
            name: "net".into(),
            description: String::new(),
            connection_info: String::new(),
            nodes: vec![],
            public_key: None,
            status,
            registrant_ip: None,
            registrant_domain: None,
            registrant_user_agent: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let store = MemoryStore::new();
        let rec = record(RecordStatus::Pending);
        NetworkStore::insert(&store, rec.clone()).await.unwrap();
        let err = NetworkStore::insert(&store, rec).await.unwrap_err();
        assert_eq!(err.reason_code(), "conflict");
    }

    #[tokio::test]
    async fn compare_and_set_on_revision() {
        let store = MemoryStore::new();
        let rec = record(RecordStatus::Pending);
        NetworkStore::insert(&store, rec.clone()).await.unwrap();

        let mut next = rec.clone();
        next.revision = 1;
        next.status = RecordStatus::Approved;
        assert!(store.update_if_revision(next.clone(), 0).await.unwrap());
        // Second writer still believes revision 0.
        assert!(!store.update_if_revision(next, 0).await.unwrap());

        let stored = NetworkStore::get(&store, rec.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RecordStatus::Approved);
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_if_revision(record(RecordStatus::Pending), 0)
            .await
            .unwrap_err();
        assert_eq!(err.reason_code(), "not-found");
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_and_filters() {
        let store = MemoryStore::new();
        let a = record(RecordStatus::Approved);
        let b = record(RecordStatus::Pending);
        let c = record(RecordStatus::Approved);
        for r in [&a, &b, &c] {
            NetworkStore::insert(&store, r.clone()).await.unwrap();
        }

        let approved = NetworkStore::list(&store, Some(RecordStatus::Approved), None)
            .await
            .unwrap();
        let ids: Vec<Uuid> = approved.iter().map(|s| s.record.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);

        let after_first = NetworkStore::list(&store, None, Some(approved[0].sequence))
            .await
            .unwrap();
        assert_eq!(after_first.len(), 2);
        assert_eq!(after_first[0].record.id, b.id);
    }

    #[tokio::test]
    async fn take_is_single_use() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let token = ChallengeToken {
            id: Uuid::new_v4(),
            puzzle: "ab".repeat(16),
            difficulty: 1,
            issued_at: now,
            expires_at: now + chrono::Duration::seconds(30),
        };
        ChallengeStore::insert(&store, token.clone()).await.unwrap();
        assert_eq!(store.take(token.id).await.unwrap(), Some(token.clone()));
        assert_eq!(store.take(token.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn purge_drops_only_expired_tokens() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for ttl in [-5, 60] {
            let token = ChallengeToken {
                id: Uuid::new_v4(),
                puzzle: "cd".repeat(16),
                difficulty: 1,
                issued_at: now,
                expires_at: now + chrono::Duration::seconds(ttl),
            };
            ChallengeStore::insert(&store, token).await.unwrap();
        }
        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert_eq!(store.challenge_count(), 1);
    }

    #[tokio::test]
    async fn ban_insert_is_idempotent() {
        let store = MemoryStore::new();
        let entry = BanEntry {
            signal_type: SignalType::Ip,
            signal_value: "10.0.0.1".into(),
            banned_at: Utc::now(),
            reason: "spam".into(),
            source_record: None,
        };
        assert!(store.insert_if_absent(entry.clone()).await.unwrap());
        assert!(!store.insert_if_absent(entry).await.unwrap());
        assert!(store.contains(SignalType::Ip, "10.0.0.1").await.unwrap());
        assert!(!store.contains(SignalType::Domain, "10.0.0.1").await.unwrap());
        assert_eq!(BanStore::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn audit_versions_are_unique() {
        let store = MemoryStore::new();
        let entry = AuditEntry {
            record_id: Uuid::new_v4(),
            version: 0,
            action: RecordAction::Create,
            actor: "registrant".into(),
            timestamp: Utc::now(),
            hash_before: None,
            hash_after: "sha256:00".into(),
            patch: json_patch::Patch(vec![]),
            request: None,
        };
        store.append(entry.clone()).await.unwrap();
        assert!(store.append(entry.clone()).await.is_err());
        assert_eq!(AuditStore::list(&store, entry.record_id).await.unwrap().len(), 1);
    }
}
