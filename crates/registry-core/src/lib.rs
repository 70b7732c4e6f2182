//! Core types for the network discovery registry.
//!
//! This crate provides the data shared by every part of the registry:
//!
//! - **Types**: network records, challenge tokens, ban entries, audit entries
//!   and the signed modification payload
//! - **Errors**: the protocol error taxonomy in [`RegistryError`], each
//!   variant with a stable reason code
//!
//! # Example
//!
//! ```rust,ignore
//! use registry_core::{NetworkRecord, RegistryError, Result};
//!
//! fn publish(record: &NetworkRecord) -> Result<()> {
//!     if !record.is_discoverable() {
//!         return Err(RegistryError::not_found(record.id.to_string()));
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod types;

pub use error::{RegistryError, Result};
pub use types::*;
