//! Append-only history of every change to a network record.

use chrono::Utc;
use ring::digest::{digest, SHA256};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use registry_core::{AuditEntry, NetworkRecord, RecordAction, RequestDetail};

use crate::identity::canonical_bytes;
use crate::store::{bounded, AuditStore};
use crate::Result;

/// Actor for registrations.
pub const ACTOR_REGISTRANT: &str = "registrant";

/// Actor for signed modifications.
pub const ACTOR_NETWORK_KEY: &str = "network-key";

/// Actor string for an administrator.
#[must_use]
pub fn admin_actor(name: &str) -> String {
    format!("admin:{name}")
}

/// JSON Patch turning `before` into `after`; a creation diffs from `{}`.
pub fn record_patch(
    before: Option<&NetworkRecord>,
    after: &NetworkRecord,
) -> Result<json_patch::Patch> {
    let from = match before {
        Some(record) => serde_json::to_value(record)?,
        None => Value::Object(Map::new()),
    };
    Ok(json_patch::diff(&from, &serde_json::to_value(after)?))
}

/// `sha256:<hex>` of the record's canonical JSON.
pub fn record_hash(record: &NetworkRecord) -> Result<String> {
    let bytes = canonical_bytes(record)?;
    Ok(format!("sha256:{}", hex::encode(digest(&SHA256, &bytes).as_ref())))
}

#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn AuditStore>,
    timeout: Duration,
}

impl AuditLog {
    #[must_use]
    pub fn new(store: Arc<dyn AuditStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Append an entry for the change `before -> after`.
    ///
    /// The entry version is `after.revision`.
    pub async fn record(
        &self,
        before: Option<&NetworkRecord>,
        after: &NetworkRecord,
        action: RecordAction,
        actor: &str,
        request: Option<RequestDetail>,
    ) -> Result<AuditEntry> {
        let entry = AuditEntry {
            record_id: after.id,
            version: after.revision,
            action,
            actor: actor.to_string(),
            timestamp: Utc::now(),
            hash_before: before.map(record_hash).transpose()?,
            hash_after: record_hash(after)?,
            patch: record_patch(before, after)?,
            request,
        };
        bounded(self.timeout, "audit.append", self.store.append(entry.clone())).await?;
        Ok(entry)
    }

    /// Entries for `record_id` by ascending version.
    pub async fn trail(&self, record_id: uuid::Uuid) -> Result<Vec<AuditEntry>> {
        bounded(self.timeout, "audit.list", self.store.list(record_id)).await
    }
}
