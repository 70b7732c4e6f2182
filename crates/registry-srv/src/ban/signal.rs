//! Identity signal normalization.
//!
//! Ban entries and lookups go through the same normalization so that
//! `10.0.0.1`, `::ffff:10.0.0.1` and ` 10.0.0.1 ` are one signal.

use std::net::IpAddr;
use url::{Host, Url};

use registry_core::{NetworkRecord, SignalType};

/// Canonical textual form of an IP address.
///
/// IPv4-mapped IPv6 addresses collapse to IPv4. Values that do not parse
/// are kept lower-cased so they still match themselves.
#[must_use]
pub fn normalize_ip(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<IpAddr>() {
        Ok(ip) => Some(ip.to_canonical().to_string()),
        Err(_) => Some(trimmed.to_ascii_lowercase()),
    }
}

/// Lower-case domain without a trailing dot.
#[must_use]
pub fn normalize_domain(raw: &str) -> Option<String> {
    let domain = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    (!domain.is_empty()).then_some(domain)
}

/// Trimmed user agent, cut to at most `max_len` characters.
#[must_use]
pub fn normalize_user_agent(raw: &str, max_len: usize) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match trimmed.char_indices().nth(max_len) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    })
}

/// Host of `url` when it is a domain name (not an IP literal).
#[must_use]
pub fn domain_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    match parsed.host()? {
        Host::Domain(domain) => normalize_domain(domain),
        Host::Ipv4(_) | Host::Ipv6(_) => None,
    }
}

/// The normalized identity signals of one registrant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalSet {
    pub ip: Option<String>,
    pub domain: Option<String>,
    pub user_agent: Option<String>,
}

impl SignalSet {
    /// Normalize raw signal values. Empty values are dropped.
    #[must_use]
    pub fn new(ip: Option<&str>, domain: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            ip: ip.and_then(normalize_ip),
            domain: domain.and_then(normalize_domain),
            user_agent: user_agent.and_then(|ua| normalize_user_agent(ua, usize::MAX)),
        }
    }

    /// Signals captured on a record at registration time.
    #[must_use]
    pub fn from_record(record: &NetworkRecord) -> Self {
        let mut set = Self::default();
        for (signal, value) in record.signals() {
            match signal {
                SignalType::Ip => set.ip = normalize_ip(value),
                SignalType::Domain => set.domain = normalize_domain(value),
                SignalType::UserAgent => set.user_agent = normalize_user_agent(value, usize::MAX),
            }
        }
        set
    }

    /// Present signals in a fixed order: IP, domain, user agent.
    pub fn iter(&self) -> impl Iterator<Item = (SignalType, &str)> {
        [
            (SignalType::Ip, self.ip.as_deref()),
            (SignalType::Domain, self.domain.as_deref()),
            (SignalType::UserAgent, self.user_agent.as_deref()),
        ]
        .into_iter()
        .filter_map(|(signal, value)| value.map(|v| (signal, v)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_normalization() {
        assert_eq!(normalize_ip(" 10.0.0.1 ").as_deref(), Some("10.0.0.1"));
        assert_eq!(normalize_ip("::ffff:10.0.0.1").as_deref(), Some("10.0.0.1"));
        assert_eq!(normalize_ip("[2001:DB8::1]").as_deref(), Some("2001:db8::1"));
        assert_eq!(normalize_ip("   "), None);
        assert_eq!(normalize_ip("Unknown").as_deref(), Some("unknown"));
    }

    #[test]
    fn domain_normalization() {
        assert_eq!(normalize_domain("Example.COM.").as_deref(), Some("example.com"));
        assert_eq!(normalize_domain(" . "), None);
    }

    #[test]
    fn user_agent_truncates_on_char_boundary() {
        assert_eq!(normalize_user_agent("  curl/8.0 ", 512).as_deref(), Some("curl/8.0"));
        assert_eq!(normalize_user_agent("ééééé", 3).as_deref(), Some("ééé"));
        assert_eq!(normalize_user_agent("", 10), None);
    }

    #[test]
    fn domain_from_connection_url() {
        assert_eq!(
            domain_from_url("https://Node.Example.org:8443/api").as_deref(),
            Some("node.example.org")
        );
        assert_eq!(domain_from_url("https://10.0.0.1/"), None);
        assert_eq!(domain_from_url("not a url"), None);
    }

    #[test]
    fn signal_set_skips_missing_values() {
        let set = SignalSet::new(Some("10.0.0.1"), None, Some(""));
        let signals: Vec<_> = set.iter().collect();
        assert_eq!(signals, vec![(SignalType::Ip, "10.0.0.1")]);
        assert!(SignalSet::default().is_empty());
    }
}
