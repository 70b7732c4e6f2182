//! The registry facade: registration, signed modification, moderation and
//! discovery over a single set of stores.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use registry_core::{
    validate_metadata, AuditEntry, BanEntry, ChallengeToken, ModerationAction,
    ModificationPayload, NetworkRecord, PublicNetwork, RecordAction, RecordStatus,
    RegistrationRequest,
};

use crate::audit::{AuditLog, ACTOR_NETWORK_KEY, ACTOR_REGISTRANT};
use crate::ban::{domain_from_url, normalize_user_agent, BanRegistry, SignalSet};
use crate::challenge::ChallengeService;
use crate::config::RegistryConfig;
use crate::discovery::{DiscoveryService, SearchCriteria, SearchPage};
use crate::identity::{self, PublicKey};
use crate::moderation::ModerationService;
use crate::request::{RequestContext, TrustedProxies};
use crate::store::{bounded, AuditStore, BanStore, ChallengeStore, MemoryStore, NetworkStore};
use crate::{RegistryError, Result};

/// Record counts for dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub banned: usize,
    /// Distinct node URLs across approved networks.
    pub node_urls: usize,
}

impl RegistryStats {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.approved + self.rejected + self.banned
    }
}

/// A network registry.
///
/// Holds no per-request state; any number of instances may share the same
/// stores concurrently.
#[derive(Clone)]
pub struct Registry {
    config: RegistryConfig,
    trusted_proxies: TrustedProxies,
    networks: Arc<dyn NetworkStore>,
    timeout: Duration,
    challenges: Arc<ChallengeService>,
    bans: BanRegistry,
    moderation: ModerationService,
    discovery: DiscoveryService,
    audit: AuditLog,
}

impl Registry {
    /// Registry over one store implementing every collection.
    pub fn new<S>(config: RegistryConfig, store: Arc<S>) -> Result<Self>
    where
        S: NetworkStore + BanStore + ChallengeStore + AuditStore + 'static,
    {
        Self::with_stores(config, store.clone(), store.clone(), store.clone(), store)
    }

    /// Registry over a fresh [`MemoryStore`].
    pub fn in_memory(config: RegistryConfig) -> Result<Self> {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Registry over separate stores per collection.
    pub fn with_stores(
        config: RegistryConfig,
        networks: Arc<dyn NetworkStore>,
        bans: Arc<dyn BanStore>,
        challenges: Arc<dyn ChallengeStore>,
        audits: Arc<dyn AuditStore>,
    ) -> Result<Self> {
        config.validate()?;
        let trusted_proxies = TrustedProxies::parse(&config.trusted_proxies)?;
        let timeout = config.store.timeout();

        let bans = BanRegistry::new(
            bans,
            Duration::from_secs(config.ban_cache.ttl_secs),
            timeout,
        );
        let audit = AuditLog::new(audits, timeout);
        let moderation =
            ModerationService::new(networks.clone(), bans.clone(), audit.clone(), timeout);

        Ok(Self {
            challenges: Arc::new(ChallengeService::new(
                challenges,
                config.challenge.clone(),
                timeout,
            )),
            discovery: DiscoveryService::new(networks.clone(), timeout),
            trusted_proxies,
            networks,
            timeout,
            bans,
            moderation,
            audit,
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    #[must_use]
    pub fn challenges(&self) -> &ChallengeService {
        &self.challenges
    }

    #[must_use]
    pub const fn bans(&self) -> &BanRegistry {
        &self.bans
    }

    /// Resolve the caller of a request using the configured trusted proxies.
    #[must_use]
    pub fn request_context(&self, headers: &[(&str, &str)], peer: IpAddr) -> RequestContext {
        RequestContext::from_headers(
            headers,
            peer,
            &self.trusted_proxies,
            self.config.max_user_agent_len,
        )
    }

    /// Issue a proof-of-work challenge.
    pub async fn issue_challenge(&self) -> Result<ChallengeToken> {
        self.challenges.issue().await
    }

    /// Register a new network.
    ///
    /// Checks run in order: input validation, challenge, ban. A ban match
    /// fails with [`RegistryError::Forbidden`] and creates nothing.
    pub async fn register(
        &self,
        request: RegistrationRequest,
        ctx: &RequestContext,
    ) -> Result<NetworkRecord> {
        validate_metadata(
            &request.name,
            &request.description,
            &request.connection_info,
            &request.nodes,
        )?;
        PublicKey::from_pem(&request.public_key)?;

        let outcome = self
            .challenges
            .check(request.challenge_token_id, &request.solution)
            .await?;
        if let Err(e) = outcome.into_result() {
            warn!(
                token = %request.challenge_token_id,
                ?outcome,
                "registration challenge rejected"
            );
            return Err(e);
        }

        let domain = ctx
            .domain
            .clone()
            .or_else(|| domain_from_url(&request.connection_info));
        let user_agent = ctx
            .user_agent
            .as_deref()
            .and_then(|ua| normalize_user_agent(ua, self.config.max_user_agent_len));
        let signals = SignalSet::new(ctx.ip.as_deref(), domain.as_deref(), user_agent.as_deref());

        if let Some((signal, value)) = self.bans.matches(&signals).await? {
            warn!(%signal, %value, name = %request.name, "registration from banned registrant");
            return Err(RegistryError::Forbidden(format!("registrant {signal} is banned")));
        }

        let now = Utc::now();
        let status = if self.config.auto_approve {
            RecordStatus::Approved
        } else {
            RecordStatus::Pending
        };
        let record = NetworkRecord {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            description: request.description,
            connection_info: request.connection_info,
            nodes: request.nodes,
            public_key: Some(request.public_key.trim().to_string()),
            status,
            registrant_ip: signals.ip,
            registrant_domain: signals.domain,
            registrant_user_agent: signals.user_agent,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        bounded(self.timeout, "network.insert", self.networks.insert(record.clone())).await?;
        self.audit
            .record(
                None,
                &record,
                RecordAction::Create,
                ACTOR_REGISTRANT,
                Some(ctx.to_detail()),
            )
            .await?;

        info!(
            network = %record.id,
            status = %record.status,
            name = %record.name,
            "registered network"
        );
        Ok(record)
    }

    /// Apply a signed modification to network `id`.
    pub async fn modify(
        &self,
        id: Uuid,
        payload: &ModificationPayload,
        signature_hex: &str,
        ctx: &RequestContext,
    ) -> Result<NetworkRecord> {
        if payload.record_id != id {
            return Err(RegistryError::InvalidInput(format!(
                "payload is for network {}, not {id}",
                payload.record_id
            )));
        }

        let Some(current) = bounded(self.timeout, "network.get", self.networks.get(id)).await?
        else {
            warn!(network = %id, "modification of unknown network");
            return Err(RegistryError::Unauthorized("unknown network".into()));
        };

        identity::authorize(&current, payload, signature_hex)?;

        if current.status == RecordStatus::Banned {
            return Err(RegistryError::Forbidden(format!("network {id} is banned")));
        }
        if payload.revision != current.revision {
            return Err(RegistryError::Conflict(format!(
                "network {id} is at revision {}, payload was signed for {}",
                current.revision, payload.revision
            )));
        }

        let updated = apply(&current, payload)?;

        let written = bounded(
            self.timeout,
            "network.update",
            self.networks.update_if_revision(updated.clone(), current.revision),
        )
        .await?;
        if !written {
            warn!(network = %id, revision = current.revision, "modification lost a race");
            return Err(RegistryError::Conflict(format!(
                "network {id} changed concurrently"
            )));
        }

        self.audit
            .record(
                Some(&current),
                &updated,
                RecordAction::Update,
                ACTOR_NETWORK_KEY,
                Some(ctx.to_detail()),
            )
            .await?;

        info!(
            network = %id,
            revision = updated.revision,
            key_rotated = payload.public_key.is_some(),
            "modified network"
        );
        Ok(updated)
    }

    /// Apply an admin moderation action.
    pub async fn moderate(
        &self,
        id: Uuid,
        action: ModerationAction,
        actor: &str,
    ) -> Result<NetworkRecord> {
        self.moderation.moderate(id, action, actor).await
    }

    /// Search approved networks.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchPage> {
        self.discovery.search(criteria).await
    }

    /// Public view of an approved network.
    pub async fn get_public(&self, id: Uuid) -> Result<PublicNetwork> {
        self.discovery.get_public(id).await
    }

    /// Full record regardless of status (admin view).
    pub async fn get(&self, id: Uuid) -> Result<NetworkRecord> {
        bounded(self.timeout, "network.get", self.networks.get(id))
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("network {id}")))
    }

    /// History of network `id`, oldest first.
    pub async fn audit_trail(&self, id: Uuid) -> Result<Vec<AuditEntry>> {
        self.audit.trail(id).await
    }

    /// Every ban entry, oldest first.
    pub async fn ban_entries(&self) -> Result<Vec<BanEntry>> {
        self.bans.list().await
    }

    /// Drop expired challenge tokens.
    pub async fn purge_expired_challenges(&self) -> Result<usize> {
        self.challenges.purge_expired().await
    }

    pub async fn stats(&self) -> Result<RegistryStats> {
        let all = bounded(self.timeout, "network.list", self.networks.list(None, None)).await?;
        let mut stats = RegistryStats::default();
        let mut urls = HashSet::new();
        for stored in &all {
            let record = &stored.record;
            match record.status {
                RecordStatus::Pending => stats.pending += 1,
                RecordStatus::Approved => {
                    stats.approved += 1;
                    urls.extend(record.nodes.iter().map(|node| node.url.trim()));
                }
                RecordStatus::Rejected => stats.rejected += 1,
                RecordStatus::Banned => stats.banned += 1,
            }
        }
        stats.node_urls = urls.len();
        Ok(stats)
    }
}

/// `current` with `payload` applied, revision bumped.
fn apply(current: &NetworkRecord, payload: &ModificationPayload) -> Result<NetworkRecord> {
    if payload.is_empty() {
        return Err(RegistryError::InvalidInput("modification changes nothing".into()));
    }

    let mut next = current.clone();
    if let Some(name) = &payload.name {
        next.name = name.trim().to_string();
    }
    if let Some(description) = &payload.description {
        next.description.clone_from(description);
    }
    if let Some(connection_info) = &payload.connection_info {
        next.connection_info.clone_from(connection_info);
    }
    if let Some(nodes) = &payload.nodes {
        next.nodes.clone_from(nodes);
    }
    if let Some(public_key) = &payload.public_key {
        PublicKey::from_pem(public_key)?;
        next.public_key = Some(public_key.trim().to_string());
    }
    validate_metadata(&next.name, &next.description, &next.connection_info, &next.nodes)?;

    if next == *current {
        return Err(RegistryError::InvalidInput("modification changes nothing".into()));
    }

    next.revision = current.revision + 1;
    next.updated_at = Utc::now();
    Ok(next)
}
