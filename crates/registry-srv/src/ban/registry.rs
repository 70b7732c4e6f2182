use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use registry_core::{BanEntry, NetworkRecord, SignalType};

use super::cache::BanCache;
use super::signal::SignalSet;
use crate::store::{bounded, BanStore};
use crate::Result;

/// Permanent bans on registrant identity signals.
///
/// A registrant is banned when any one of its signals matches an entry.
#[derive(Clone)]
pub struct BanRegistry {
    store: Arc<dyn BanStore>,
    cache: Arc<BanCache>,
    timeout: Duration,
}

impl BanRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn BanStore>, cache_ttl: Duration, timeout: Duration) -> Self {
        Self {
            store,
            cache: Arc::new(BanCache::new(cache_ttl)),
            timeout,
        }
    }

    /// First banned signal among `signals`, if any.
    ///
    /// Store errors propagate so the caller can refuse the request.
    pub async fn matches(&self, signals: &SignalSet) -> Result<Option<(SignalType, String)>> {
        for (signal, value) in signals.iter() {
            if self.cache.contains(signal, value) {
                return Ok(Some((signal, value.to_string())));
            }
            if bounded(self.timeout, "ban.contains", self.store.contains(signal, value)).await? {
                self.cache.record(signal, value);
                return Ok(Some((signal, value.to_string())));
            }
        }
        Ok(None)
    }

    /// Whether any of the given signals is banned.
    ///
    /// Fails closed: a lookup error counts as banned.
    pub async fn is_banned(
        &self,
        ip: Option<&str>,
        domain: Option<&str>,
        user_agent: Option<&str>,
    ) -> bool {
        match self.matches(&SignalSet::new(ip, domain, user_agent)).await {
            Ok(hit) => hit.is_some(),
            Err(e) => {
                warn!(error = %e, "ban lookup failed closed");
                true
            }
        }
    }

    /// Ban every signal on `record`. Returns how many entries were new.
    pub async fn ban(&self, record: &NetworkRecord, reason: &str) -> Result<usize> {
        let banned_at = Utc::now();
        let mut inserted = 0;
        for (signal, value) in SignalSet::from_record(record).iter() {
            let entry = BanEntry {
                signal_type: signal,
                signal_value: value.to_string(),
                banned_at,
                reason: reason.to_string(),
                source_record: Some(record.id),
            };
            if bounded(self.timeout, "ban.insert", self.store.insert_if_absent(entry)).await? {
                inserted += 1;
            }
            self.cache.record(signal, value);
        }
        info!(network = %record.id, inserted, "recorded ban entries");
        Ok(inserted)
    }

    /// All ban entries, oldest first.
    pub async fn list(&self) -> Result<Vec<BanEntry>> {
        bounded(self.timeout, "ban.list", self.store.list()).await
    }
}
