//! registry-srv: trust and lifecycle protocol for a public network registry.
//!
//! Independently operated networks announce themselves here for discovery.
//! Three mechanisms gate what gets in and what may change:
//!
//! - **Proof of work** on registration ([`challenge`]): a client must spend
//!   bounded computation before its registration is considered.
//! - **Signatures** on modification ([`identity`]): every change after
//!   registration is signed by the key registered with the network.
//! - **Moderation and bans** ([`moderation`], [`ban`]): admins approve,
//!   reject or ban networks; a ban blocks the registrant's IP, domain and
//!   user agent permanently.
//!
//! Approved networks are served by [`discovery`]. Persistence is behind the
//! traits in [`store`]; [`store::MemoryStore`] implements all of them.
//!
//! # Example
//!
//! ```rust,ignore
//! use registry_srv::{Registry, RegistryConfig, RequestContext};
//!
//! let registry = Registry::in_memory(RegistryConfig::default())?;
//! let token = registry.issue_challenge().await?;
//! // ... client solves token.puzzle and submits a RegistrationRequest
//! let record = registry.register(request, &ctx).await?;
//! ```

pub mod audit;
pub mod ban;
pub mod challenge;
pub mod config;
pub mod discovery;
pub mod identity;
pub mod moderation;
mod registry;
pub mod request;
pub mod store;

pub use config::RegistryConfig;
pub use registry::{Registry, RegistryStats};
pub use registry_core::{RegistryError, Result};
pub use request::RequestContext;
