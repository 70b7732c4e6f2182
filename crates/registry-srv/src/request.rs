//! Client identity extracted from transport headers.
//!
//! The client address is resolved by appending the socket peer to the
//! forwarding chain and walking it from the right, skipping hops that are
//! trusted proxies. The first untrusted hop is the client. With no trusted
//! proxies configured, forwarding headers are ignored and the peer is the
//! client.

use std::net::IpAddr;

use registry_core::{RequestDetail, UNKNOWN_USER_AGENT};

use crate::ban::{normalize_domain, normalize_ip, normalize_user_agent};
use crate::{RegistryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    fn parse(raw: &str) -> Result<Self> {
        let invalid = || RegistryError::Config(format!("invalid trusted proxy: {raw:?}"));
        let (addr, prefix) = match raw.trim().split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix.parse::<u8>().map_err(|_| invalid())?)),
            None => (raw.trim(), None),
        };
        let addr = addr.parse::<IpAddr>().map_err(|_| invalid())?.to_canonical();
        let max = if addr.is_ipv4() { 32 } else { 128 };
        let prefix = prefix.unwrap_or(max);
        if prefix > max {
            return Err(invalid());
        }
        // Host bits are allowed and masked off.
        Ok(Self {
            network: mask(addr, prefix),
            prefix,
        })
    }

    fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        ip.is_ipv4() == self.network.is_ipv4() && mask(ip, self.prefix) == self.network
    }
}

fn mask(ip: IpAddr, prefix: u8) -> IpAddr {
    match ip {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V4((bits & mask).into())
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
            IpAddr::V6((bits & mask).into())
        }
    }
}

/// Proxies whose forwarding headers are believed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxies {
    networks: Vec<Cidr>,
}

impl TrustedProxies {
    /// Parse IP addresses and CIDR ranges.
    pub fn parse(entries: &[String]) -> Result<Self> {
        let networks = entries
            .iter()
            .filter(|e| !e.trim().is_empty())
            .map(|e| Cidr::parse(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { networks })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Whether `hop` is an address inside a trusted range.
    #[must_use]
    pub fn is_trusted(&self, hop: &str) -> bool {
        hop.parse::<IpAddr>()
            .is_ok_and(|ip| self.networks.iter().any(|net| net.contains(ip)))
    }
}

/// Identity signals of the caller, as seen by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub domain: Option<String>,
}

impl RequestContext {
    /// Context with already-known values, normalized.
    #[must_use]
    pub fn new(ip: Option<&str>, user_agent: Option<&str>, domain: Option<&str>) -> Self {
        Self {
            ip: ip.and_then(normalize_ip),
            user_agent: user_agent.and_then(|ua| normalize_user_agent(ua, usize::MAX)),
            domain: domain.and_then(normalize_domain),
        }
    }

    /// Resolve the caller from request headers and the socket peer.
    ///
    /// Header names match case-insensitively.
    #[must_use]
    pub fn from_headers(
        headers: &[(&str, &str)],
        peer: IpAddr,
        trusted: &TrustedProxies,
        max_user_agent_len: usize,
    ) -> Self {
        let header = |name: &str| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| *value)
        };

        let mut chain = if trusted.is_empty() {
            Vec::new()
        } else {
            forwarded_chain(header("forwarded"))
                .or_else(|| x_forwarded_for_chain(header("x-forwarded-for")))
                .or_else(|| header("x-real-ip").and_then(hop).map(|h| vec![h]))
                .unwrap_or_default()
        };
        chain.push(peer.to_string());

        let client = chain
            .iter()
            .rev()
            .find(|h| !trusted.is_trusted(h))
            .cloned()
            .unwrap_or_else(|| peer.to_string());

        Self {
            ip: normalize_ip(&client),
            user_agent: header("user-agent")
                .and_then(|ua| normalize_user_agent(ua, max_user_agent_len)),
            domain: None,
        }
    }

    /// Set the registrant domain.
    #[must_use]
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = normalize_domain(domain);
        self
    }

    /// Detail stored on audit entries. A missing user agent is labelled
    /// [`UNKNOWN_USER_AGENT`].
    #[must_use]
    pub fn to_detail(&self) -> RequestDetail {
        RequestDetail {
            ip_address: self.ip.clone(),
            user_agent: Some(
                self.user_agent
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_USER_AGENT.to_string()),
            ),
        }
    }
}

// RFC 7239: `Forwarded: for=192.0.2.60;proto=http, for="[2001:db8::1]:4711"`
fn forwarded_chain(value: Option<&str>) -> Option<Vec<String>> {
    let chain: Vec<String> = value?
        .split(',')
        .flat_map(|element| element.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            key.trim().eq_ignore_ascii_case("for").then(|| hop(value))?
        })
        .collect();
    (!chain.is_empty()).then_some(chain)
}

fn x_forwarded_for_chain(value: Option<&str>) -> Option<Vec<String>> {
    let chain: Vec<String> = value?.split(',').filter_map(hop).collect();
    (!chain.is_empty()).then_some(chain)
}

// One hop: strips quotes, brackets and ports.
fn hop(raw: &str) -> Option<String> {
    let value = raw.trim().trim_matches('"');
    if value.is_empty() {
        return None;
    }
    if let Some(rest) = value.strip_prefix('[') {
        return rest.split(']').next().map(str::to_string);
    }
    if value.parse::<IpAddr>().is_ok() {
        return Some(value.to_string());
    }
    // host:port with a single colon is IPv4 (or a token) with a port.
    match value.split_once(':') {
        Some((host, port)) if !port.contains(':') => Some(host.to_string()),
        _ => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trusted(entries: &[&str]) -> TrustedProxies {
        let entries: Vec<String> = entries.iter().map(|s| (*s).to_string()).collect();
        TrustedProxies::parse(&entries).unwrap()
    }

    fn peer(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn cidr_matching() {
        let proxies = trusted(&["10.0.0.0/8", "192.168.1.7", "2001:db8::/32", "172.16.5.9/16"]);
        assert!(proxies.is_trusted("10.200.3.4"));
        assert!(proxies.is_trusted("192.168.1.7"));
        assert!(!proxies.is_trusted("192.168.1.8"));
        assert!(proxies.is_trusted("2001:db8:ffff::1"));
        assert!(proxies.is_trusted("::ffff:10.1.1.1"));
        assert!(proxies.is_trusted("172.16.0.1"));
        assert!(!proxies.is_trusted("not-an-ip"));
    }

    #[test]
    fn rejects_bad_proxy_entries() {
        assert!(TrustedProxies::parse(&["10.0.0.0/33".to_string()]).is_err());
        assert!(TrustedProxies::parse(&["example.com".to_string()]).is_err());
        assert!(TrustedProxies::parse(&[String::new()]).unwrap().is_empty());
    }

    #[test]
    fn headers_ignored_without_trusted_proxies() {
        let ctx = RequestContext::from_headers(
            &[("X-Forwarded-For", "198.51.100.1")],
            peer("203.0.113.5"),
            &TrustedProxies::default(),
            512,
        );
        assert_eq!(ctx.ip.as_deref(), Some("203.0.113.5"));
    }

    #[test]
    fn x_forwarded_for_walks_from_the_right() {
        let ctx = RequestContext::from_headers(
            &[("x-forwarded-for", "198.51.100.1, 203.0.113.9, 10.0.0.2")],
            peer("10.0.0.1"),
            &trusted(&["10.0.0.0/8"]),
            512,
        );
        assert_eq!(ctx.ip.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn forwarded_header_takes_precedence() {
        let ctx = RequestContext::from_headers(
            &[
                ("Forwarded", r#"for="[2001:db8::17]:4711";proto=https, for=10.0.0.3"#),
                ("X-Forwarded-For", "198.51.100.1"),
            ],
            peer("10.0.0.1"),
            &trusted(&["10.0.0.0/8"]),
            512,
        );
        assert_eq!(ctx.ip.as_deref(), Some("2001:db8::17"));
    }

    #[test]
    fn x_real_ip_with_port() {
        let ctx = RequestContext::from_headers(
            &[("X-Real-IP", "198.51.100.4:5555")],
            peer("10.0.0.1"),
            &trusted(&["10.0.0.1"]),
            512,
        );
        assert_eq!(ctx.ip.as_deref(), Some("198.51.100.4"));
    }

    #[test]
    fn all_hops_trusted_falls_back_to_peer() {
        let ctx = RequestContext::from_headers(
            &[("X-Forwarded-For", "10.0.0.9")],
            peer("10.0.0.1"),
            &trusted(&["10.0.0.0/8"]),
            512,
        );
        assert_eq!(ctx.ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn missing_user_agent_is_only_an_audit_label() {
        let none =
            RequestContext::from_headers(&[], peer("192.0.2.1"), &TrustedProxies::default(), 512);
        assert_eq!(none.user_agent, None);
        assert_eq!(none.to_detail().user_agent.as_deref(), Some(UNKNOWN_USER_AGENT));

        let blank = RequestContext::from_headers(
            &[("User-Agent", "   ")],
            peer("192.0.2.1"),
            &TrustedProxies::default(),
            512,
        );
        assert_eq!(blank.user_agent, None);
    }

    #[test]
    fn user_agent_truncation() {

        let long = "a".repeat(600);
        let ctx = RequestContext::from_headers(
            &[("User-Agent", long.as_str())],
            peer("192.0.2.1"),
            &TrustedProxies::default(),
            512,
        );
        assert_eq!(ctx.user_agent.map(|ua| ua.len()), Some(512));
    }

    #[test]
    fn detail_carries_ip_and_agent() {
        let ctx = RequestContext::new(Some("192.0.2.1"), Some("curl/8"), None)
            .with_domain("Example.org");
        assert_eq!(ctx.domain.as_deref(), Some("example.org"));
        let detail = ctx.to_detail();
        assert_eq!(detail.ip_address.as_deref(), Some("192.0.2.1"));
        assert_eq!(detail.user_agent.as_deref(), Some("curl/8"));
    }
}
