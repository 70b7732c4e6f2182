//! Read-only discovery over approved networks.
//!
//! Results are [`PublicNetwork`] projections: no public key and no
//! registrant signals. Status is re-checked on every record the store
//! returns, so a store that ignores the status filter still cannot leak
//! pending, rejected or banned networks.

pub mod query;

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use registry_core::{PublicNetwork, RecordStatus};

pub use query::{SearchCriteria, SearchPage, SortOrder, MAX_PAGE_SIZE};

use crate::store::{bounded, NetworkStore, StoredNetwork};
use crate::{RegistryError, Result};

#[derive(Clone)]
pub struct DiscoveryService {
    networks: Arc<dyn NetworkStore>,
    timeout: Duration,
}

impl DiscoveryService {
    #[must_use]
    pub fn new(networks: Arc<dyn NetworkStore>, timeout: Duration) -> Self {
        Self { networks, timeout }
    }

    /// One page of approved networks matching `criteria`.
    ///
    /// With the default insertion order the cursor is a store sequence
    /// position, so pages stay stable while new networks are approved.
    /// Other orders page by offset.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchPage> {
        let position = criteria.cursor_position()?;
        let after = match criteria.sort {
            SortOrder::Inserted => position,
            SortOrder::Name | SortOrder::Updated => None,
        };

        let mut hits: Vec<StoredNetwork> = bounded(
            self.timeout,
            "network.list",
            self.networks.list(Some(RecordStatus::Approved), after),
        )
        .await?
        .into_iter()
        .filter(|stored| stored.record.is_discoverable() && criteria.matches(&stored.record))
        .collect();

        let offset = match criteria.sort {
            SortOrder::Inserted => {
                hits.sort_by_key(|stored| stored.sequence);
                0
            }
            SortOrder::Name => {
                hits.sort_by(|a, b| {
                    a.record
                        .name
                        .to_lowercase()
                        .cmp(&b.record.name.to_lowercase())
                        .then(a.sequence.cmp(&b.sequence))
                });
                usize::try_from(position.unwrap_or(0)).unwrap_or(usize::MAX)
            }
            SortOrder::Updated => {
                hits.sort_by_key(|stored| (Reverse(stored.record.updated_at), stored.sequence));
                usize::try_from(position.unwrap_or(0)).unwrap_or(usize::MAX)
            }
        };

        let total = hits.len();
        let page: Vec<StoredNetwork> = hits
            .into_iter()
            .skip(offset)
            .take(criteria.page_size())
            .collect();
        let end = offset.saturating_add(page.len());

        let next_cursor = if end < total {
            match criteria.sort {
                SortOrder::Inserted => page.last().map(|stored| stored.sequence.to_string()),
                SortOrder::Name | SortOrder::Updated => Some(end.to_string()),
            }
        } else {
            None
        };

        debug!(
            matched = total,
            returned = page.len(),
            sort = ?criteria.sort,
            "discovery search"
        );

        Ok(SearchPage {
            items: page.iter().map(|stored| stored.record.to_public()).collect(),
            next_cursor,
        })
    }

    /// Public projection of network `id`, only if it is approved.
    pub async fn get_public(&self, id: Uuid) -> Result<PublicNetwork> {
        bounded(self.timeout, "network.get", self.networks.get(id))
            .await?
            .filter(|record| record.is_discoverable())
            .map(|record| record.to_public())
            .ok_or_else(|| RegistryError::not_found(format!("network {id}")))
    }
}
