//! Registry configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::challenge::pow::MAX_DIFFICULTY;
use crate::{RegistryError, Result};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DR_";

/// Longest allowed challenge token lifetime (one day).
pub const MAX_CHALLENGE_TTL_SECS: u64 = 86_400;

/// Configuration for a registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Approve registrations immediately (unattended deployments).
    #[serde(default)]
    pub auto_approve: bool,

    /// Proxies whose forwarding headers are trusted (IP or CIDR).
    #[serde(default)]
    pub trusted_proxies: Vec<String>,

    /// User agents longer than this are truncated before storage.
    #[serde(default = "default_max_user_agent_len")]
    pub max_user_agent_len: usize,

    /// Proof-of-work settings.
    #[serde(default)]
    pub challenge: ChallengeConfig,

    /// Backing store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Ban lookup cache settings.
    #[serde(default)]
    pub ban_cache: BanCacheConfig,
}

/// Proof-of-work challenge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeConfig {
    /// Base number of leading zero bits (default: 20).
    #[serde(default = "default_base_difficulty")]
    pub base_difficulty: u8,

    /// Load adjustment added to the base difficulty.
    #[serde(default)]
    pub difficulty_shift: i8,

    /// Token lifetime in seconds (default: 300).
    #[serde(default = "default_challenge_ttl")]
    pub ttl_secs: u64,
}

/// Backing store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Per-call timeout in milliseconds (default: 2000).
    #[serde(default = "default_store_timeout")]
    pub timeout_ms: u64,
}

/// Ban lookup cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanCacheConfig {
    /// How long a positive ban hit is remembered; 0 disables the cache.
    #[serde(default = "default_ban_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_approve: false,
            challenge: ChallengeConfig::default(),
            store: StoreConfig::default(),
            ban_cache: BanCacheConfig::default(),
            trusted_proxies: Vec::new(),
            max_user_agent_len: default_max_user_agent_len(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            base_difficulty: default_base_difficulty(),
            difficulty_shift: 0,
            ttl_secs: default_challenge_ttl(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_store_timeout(),
        }
    }
}

impl Default for BanCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ban_cache_ttl(),
        }
    }
}

impl ChallengeConfig {
    /// Difficulty actually handed out: base plus shift, clamped to 1..=64.
    #[must_use]
    pub fn effective_difficulty(&self) -> u8 {
        let raw = i16::from(self.base_difficulty) + i16::from(self.difficulty_shift);
        u8::try_from(raw.clamp(1, i16::from(MAX_DIFFICULTY))).unwrap_or(MAX_DIFFICULTY)
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl StoreConfig {
    /// Per-call store timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl RegistryConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                RegistryError::Config(format!("failed to read {}: {e}", path.display()))
            })?;
            toml::from_str(&content).map_err(|e| RegistryError::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `DR_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(std::env::vars())
    }

    /// Apply `DR_*` overrides from an arbitrary set of variables.
    ///
    /// Unknown `DR_` keys are ignored; known keys with unparsable values are
    /// a configuration error.
    pub fn apply_overrides<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref().trim();
            match name {
                "AUTO_APPROVE" => self.auto_approve = parse_env(name, value)?,
                "BASE_DIFFICULTY" => self.challenge.base_difficulty = parse_env(name, value)?,
                "DIFFICULTY_SHIFT" => self.challenge.difficulty_shift = parse_env(name, value)?,
                "CHALLENGE_TTL_SECS" => self.challenge.ttl_secs = parse_env(name, value)?,
                "STORE_TIMEOUT_MS" => self.store.timeout_ms = parse_env(name, value)?,
                "BAN_CACHE_TTL_SECS" => self.ban_cache.ttl_secs = parse_env(name, value)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject settings the registry cannot run with.
    pub fn validate(&self) -> Result<()> {
        let raw = i16::from(self.challenge.base_difficulty)
            + i16::from(self.challenge.difficulty_shift);
        if !(1..=i16::from(MAX_DIFFICULTY)).contains(&raw) {
            return Err(RegistryError::Config(format!(
                "effective difficulty {raw} outside 1..={MAX_DIFFICULTY}"
            )));
        }
        if !(1..=MAX_CHALLENGE_TTL_SECS).contains(&self.challenge.ttl_secs) {
            return Err(RegistryError::Config(format!(
                "challenge.ttl_secs must be in 1..={MAX_CHALLENGE_TTL_SECS}"
            )));
        }
        if self.store.timeout_ms == 0 {
            return Err(RegistryError::Config("store.timeout_ms must be > 0".into()));
        }
        crate::request::TrustedProxies::parse(&self.trusted_proxies)?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RegistryError::Config(format!("{ENV_PREFIX}{name}={value:?}: {e}")))
}

// Default value functions for serde.
const fn default_base_difficulty() -> u8 {
    20
}

const fn default_challenge_ttl() -> u64 {
    300
}

const fn default_store_timeout() -> u64 {
    2000
}

const fn default_ban_cache_ttl() -> u64 {
    30
}

const fn default_max_user_agent_len() -> usize {
    512
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert!(!config.auto_approve);
        assert_eq!(config.challenge.base_difficulty, 20);
        assert_eq!(config.challenge.effective_difficulty(), 20);
        assert_eq!(config.challenge.ttl(), Duration::from_secs(300));
        assert_eq!(config.store.timeout(), Duration::from_millis(2000));
        assert_eq!(config.ban_cache.ttl_secs, 30);
        assert!(config.trusted_proxies.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_effective_difficulty_clamps() {
        let mut challenge = ChallengeConfig {
            base_difficulty: 4,
            difficulty_shift: -10,
            ttl_secs: 60,
        };
        assert_eq!(challenge.effective_difficulty(), 1);
        challenge.base_difficulty = 60;
        challenge.difficulty_shift = 10;
        assert_eq!(challenge.effective_difficulty(), 64);
    }

    #[test]
    fn test_load_partial_toml() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmpfile,
            r#"
auto_approve = true
trusted_proxies = ["10.0.0.0/8"]

[challenge]
base_difficulty = 12
"#
        )
        .unwrap();

        let config = RegistryConfig::load(tmpfile.path()).unwrap();
        assert!(config.auto_approve);
        assert_eq!(config.challenge.base_difficulty, 12);
        // Unspecified fields keep their defaults.
        assert_eq!(config.challenge.ttl_secs, 300);
        assert_eq!(config.store.timeout_ms, 2000);
        assert_eq!(config.trusted_proxies, vec!["10.0.0.0/8"]);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let config =
            RegistryConfig::load(std::path::Path::new("/tmp/nonexistent_registry.toml")).unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RegistryConfig::default();
        config
            .apply_overrides([
                ("DR_AUTO_APPROVE", "true"),
                ("DR_DIFFICULTY_SHIFT", "-4"),
                ("DR_STORE_TIMEOUT_MS", "250"),
                ("DR_SOMETHING_ELSE", "ignored"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();
        assert!(config.auto_approve);
        assert_eq!(config.challenge.effective_difficulty(), 16);
        assert_eq!(config.store.timeout_ms, 250);
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = RegistryConfig::default();
        let err = config
            .apply_overrides([("DR_BASE_DIFFICULTY", "hard")])
            .unwrap_err();
        assert_eq!(err.reason_code(), "config");
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = RegistryConfig::default();
        config.store.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RegistryConfig::default();
        config.challenge.ttl_secs = 0;
        assert!(config.validate().is_err());

        let mut config = RegistryConfig::default();
        config.trusted_proxies = vec!["not-an-ip".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_challenge_ttl() {
        let mut config = RegistryConfig::default();
        config.challenge.ttl_secs = MAX_CHALLENGE_TTL_SECS;
        assert!(config.validate().is_ok());

        config.challenge.ttl_secs = MAX_CHALLENGE_TTL_SECS + 1;
        assert_eq!(config.validate().unwrap_err().reason_code(), "config");

        let mut config = RegistryConfig::default();
        config
            .apply_overrides([("DR_CHALLENGE_TTL_SECS", "10000000000000")])
            .unwrap();
        assert!(config.validate().is_err());
    }
}
