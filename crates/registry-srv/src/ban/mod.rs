//! Ban registry: permanent bans keyed on registrant IP, domain and user agent.

pub mod cache;
pub mod registry;
pub mod signal;

pub use cache::BanCache;
pub use registry::BanRegistry;
pub use signal::{domain_from_url, normalize_domain, normalize_ip, normalize_user_agent, SignalSet};
