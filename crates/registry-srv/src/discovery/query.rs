use serde::{Deserialize, Serialize};
use std::str::FromStr;

use registry_core::{NetworkRecord, PublicNetwork};

use crate::RegistryError;

/// Largest page a single search returns.
pub const MAX_PAGE_SIZE: usize = 100;

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Registration order, oldest first
    #[default]
    Inserted,
    /// Name, case-insensitive
    Name,
    /// Most recently updated first
    Updated,
}

impl FromStr for SortOrder {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "inserted" => Ok(Self::Inserted),
            "name" => Ok(Self::Name),
            "updated" => Ok(Self::Updated),
            other => Err(RegistryError::InvalidInput(format!("unknown sort order: {other}"))),
        }
    }
}

/// Search filters and paging.
///
/// Text filters are case-insensitive substrings; every given filter must
/// match. Blank filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchCriteria {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Matches any node URL.
    pub url: Option<String>,
    pub sort: SortOrder,
    /// Opaque position from a previous page's `next_cursor`.
    pub cursor: Option<String>,
    /// Page size; 0 means no limit, otherwise capped at [`MAX_PAGE_SIZE`].
    pub limit: usize,
}

impl SearchCriteria {
    /// Criteria matching every record whose name contains `text`.
    #[must_use]
    pub fn by_name(text: &str) -> Self {
        Self {
            name: Some(text.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Whether `record`'s metadata matches the text filters.
    ///
    /// Status is not considered here.
    #[must_use]
    pub fn matches(&self, record: &NetworkRecord) -> bool {
        contains(&record.name, self.name.as_deref())
            && contains(&record.description, self.description.as_deref())
            && needle(self.url.as_deref()).map_or(true, |n| {
                record.nodes.iter().any(|node| node.url.to_lowercase().contains(&n))
            })
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        if self.limit == 0 {
            usize::MAX
        } else {
            self.limit.min(MAX_PAGE_SIZE)
        }
    }

    pub(crate) fn cursor_position(&self) -> crate::Result<Option<u64>> {
        self.cursor
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| {
                c.parse::<u64>()
                    .map_err(|_| RegistryError::InvalidInput(format!("invalid cursor: {c}")))
            })
            .transpose()
    }
}

fn needle(filter: Option<&str>) -> Option<String> {
    filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: &str, filter: Option<&str>) -> bool {
    needle(filter).map_or(true, |n| haystack.to_lowercase().contains(&n))
}

/// One page of discovery results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub items: Vec<PublicNetwork>,
    /// Pass back as `cursor` for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}
