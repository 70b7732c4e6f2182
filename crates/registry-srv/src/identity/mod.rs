//! Network identity: canonical payload bytes, public keys and signatures.

pub mod canonical;
pub mod keys;
pub mod verifier;

pub use canonical::{canonical_bytes, canonical_string, CANONICAL_VERSION};
pub use keys::{KeyAlgorithm, PublicKey, SigningKey};
pub use verifier::{authorize, verify};
