//! Short-lived cache of positive ban lookups.
//!
//! Only hits are remembered. A miss always goes to the store, so a new ban
//! takes effect on the very next lookup.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use registry_core::SignalType;

#[derive(Debug)]
pub struct BanCache {
    hits: DashMap<(SignalType, String), Instant>,
    ttl: Duration,
}

impl BanCache {
    /// A zero `ttl` disables caching.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            hits: DashMap::new(),
            ttl,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Whether `(signal, value)` was seen banned within the TTL.
    #[must_use]
    pub fn contains(&self, signal: SignalType, value: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let key = (signal, value.to_string());
        self.hits.remove_if(&key, |_, seen| seen.elapsed() >= self.ttl);
        self.hits.contains_key(&key)
    }

    /// Remember a positive lookup.
    pub fn record(&self, signal: SignalType, value: &str) {
        if self.is_enabled() {
            self.hits.insert((signal, value.to_string()), Instant::now());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
