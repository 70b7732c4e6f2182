use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use registry_core::{ModerationAction, NetworkRecord};

use super::transition::next_status;
use crate::audit::{admin_actor, AuditLog};
use crate::ban::BanRegistry;
use crate::store::{bounded, NetworkStore};
use crate::{RegistryError, Result};

/// Applies admin moderation actions to network records.
///
/// Admin authentication happens before this point; `actor` is recorded as-is.
#[derive(Clone)]
pub struct ModerationService {
    networks: Arc<dyn NetworkStore>,
    bans: BanRegistry,
    audit: AuditLog,
    timeout: Duration,
}

impl ModerationService {
    #[must_use]
    pub fn new(
        networks: Arc<dyn NetworkStore>,
        bans: BanRegistry,
        audit: AuditLog,
        timeout: Duration,
    ) -> Self {
        Self {
            networks,
            bans,
            audit,
            timeout,
        }
    }

    /// Apply `action` to record `id` and return the updated record.
    ///
    /// A lost optimistic race is retried once against a fresh read; a second
    /// loss surfaces as [`RegistryError::Conflict`].
    pub async fn moderate(
        &self,
        id: Uuid,
        action: ModerationAction,
        actor: &str,
    ) -> Result<NetworkRecord> {
        match self.attempt(id, action, actor).await {
            Err(RegistryError::Conflict(reason)) => {
                warn!(network = %id, %action, %reason, "moderation lost a race, retrying");
                self.attempt(id, action, actor).await
            }
            other => other,
        }
    }

    async fn attempt(
        &self,
        id: Uuid,
        action: ModerationAction,
        actor: &str,
    ) -> Result<NetworkRecord> {
        let current = bounded(self.timeout, "network.get", self.networks.get(id))
            .await?
            .ok_or_else(|| RegistryError::not_found(format!("network {id}")))?;

        let status = next_status(current.status, action).ok_or_else(|| {
            RegistryError::InvalidTransition {
                from: current.status.to_string(),
                action: action.to_string(),
            }
        })?;

        // Ban entries go in first so a failed status write still blocks the
        // registrant; inserts are idempotent on retry.
        if action == ModerationAction::Ban {
            self.bans
                .ban(&current, &format!("network {id} banned by {actor}"))
                .await?;
        }

        let mut updated = current.clone();
        updated.status = status;
        updated.revision = current.revision + 1;
        updated.updated_at = Utc::now();

        let written = bounded(
            self.timeout,
            "network.update",
            self.networks.update_if_revision(updated.clone(), current.revision),
        )
        .await?;
        if !written {
            return Err(RegistryError::Conflict(format!(
                "network {id} changed during moderation"
            )));
        }

        self.audit
            .record(
                Some(&current),
                &updated,
                action.into(),
                &admin_actor(actor),
                None,
            )
            .await?;

        info!(
            network = %id,
            %action,
            from = %current.status,
            to = %updated.status,
            actor,
            "moderated network"
        );
        Ok(updated)
    }
}
