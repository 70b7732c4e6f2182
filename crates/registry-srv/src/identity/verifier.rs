//! Signature checks on modification requests.

use serde::Serialize;
use tracing::warn;

use registry_core::{ModificationPayload, NetworkRecord};

use super::canonical::canonical_bytes;
use super::keys::PublicKey;
use crate::{RegistryError, Result};

/// Whether `signature_hex` is a valid signature by `public_key_pem` over the
/// canonical form of `payload`.
///
/// Never errors: malformed keys, malformed signatures and unserializable
/// payloads all verify as `false`.
pub fn verify<T: Serialize + ?Sized>(
    public_key_pem: &str,
    payload: &T,
    signature_hex: &str,
) -> bool {
    let Ok(key) = PublicKey::from_pem(public_key_pem) else {
        return false;
    };
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(message) = canonical_bytes(payload) else {
        return false;
    };
    key.verify(&message, &signature)
}

/// Authorize `payload` against the key on file for `record`.
///
/// # Errors
///
/// - [`RegistryError::InvalidInput`] if the signature is not hex
/// - [`RegistryError::Unauthorized`] if the record has no usable key or the
///   signature does not verify
pub fn authorize(
    record: &NetworkRecord,
    payload: &ModificationPayload,
    signature_hex: &str,
) -> Result<()> {
    let Some(pem_text) = record
        .public_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
    else {
        warn!(network = %record.id, "modification refused: no public key on file");
        return Err(RegistryError::Unauthorized(
            "network has no public key on file".into(),
        ));
    };

    let signature = hex::decode(signature_hex.trim())
        .map_err(|e| RegistryError::InvalidInput(format!("signature is not hex: {e}")))?;

    let key = PublicKey::from_pem(pem_text).map_err(|e| {
        warn!(network = %record.id, error = %e, "stored public key is unusable");
        RegistryError::Unauthorized("public key on file is unusable".into())
    })?;

    let message = canonical_bytes(payload)?;
    if key.verify(&message, &signature) {
        Ok(())
    } else {
        warn!(network = %record.id, algorithm = %key.algorithm(), "signature verification failed");
        Err(RegistryError::Unauthorized(
            "signature verification failed".into(),
        ))
    }
}
