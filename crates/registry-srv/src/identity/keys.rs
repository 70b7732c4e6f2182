//! Public key parsing and client-side signing keys.
//!
//! Keys travel as PEM. Public keys are `PUBLIC KEY` blocks
//! (SubjectPublicKeyInfo); private keys are `PRIVATE KEY` blocks (PKCS#8).
//!
//! | algorithm | SPKI key bytes | signature |
//! |-----------|----------------|-----------|
//! | ECDSA P-256 | 65-byte uncompressed point | ASN.1 DER, SHA-256 |
//! | ECDSA P-384 | 97-byte uncompressed point | ASN.1 DER, SHA-256 |
//! | Ed25519 | 32 bytes | 64 raw bytes |

use pem::Pem;
use ring::rand::SystemRandom;
use ring::signature::{
    self, EcdsaKeyPair, Ed25519KeyPair, KeyPair, UnparsedPublicKey, VerificationAlgorithm,
};
use serde::Serialize;
use x509_parser::prelude::{FromDer, SubjectPublicKeyInfo};

use super::canonical::canonical_bytes;
use crate::{RegistryError, Result};

const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_ED25519: &str = "1.3.101.112";

const P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08,
    0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];
const P384_SPKI_PREFIX: [u8; 23] = [
    0x30, 0x76, 0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05,
    0x2b, 0x81, 0x04, 0x00, 0x22, 0x03, 0x62, 0x00,
];
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// Supported signature schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// ECDSA over P-256 with SHA-256
    EcdsaP256,
    /// ECDSA over P-384 with SHA-256 (verification only)
    EcdsaP384,
    /// Ed25519
    Ed25519,
}

impl KeyAlgorithm {
    fn verification(self) -> &'static dyn VerificationAlgorithm {
        match self {
            Self::EcdsaP256 => &signature::ECDSA_P256_SHA256_ASN1,
            Self::EcdsaP384 => &signature::ECDSA_P384_SHA256_ASN1,
            Self::Ed25519 => &signature::ED25519,
        }
    }

    const fn spki_prefix(self) -> &'static [u8] {
        match self {
            Self::EcdsaP256 => &P256_SPKI_PREFIX,
            Self::EcdsaP384 => &P384_SPKI_PREFIX,
            Self::Ed25519 => &ED25519_SPKI_PREFIX,
        }
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EcdsaP256 => write!(f, "ecdsa-p256"),
            Self::EcdsaP384 => write!(f, "ecdsa-p384"),
            Self::Ed25519 => write!(f, "ed25519"),
        }
    }
}

/// A parsed public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: KeyAlgorithm,
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Parse a PEM `PUBLIC KEY` block.
    pub fn from_pem(text: &str) -> Result<Self> {
        let block = pem::parse(text.trim())
            .map_err(|e| RegistryError::InvalidInput(format!("public key is not valid PEM: {e}")))?;
        if block.tag() != "PUBLIC KEY" {
            return Err(RegistryError::InvalidInput(format!(
                "expected a PUBLIC KEY block, got {}",
                block.tag()
            )));
        }
        Self::from_spki_der(block.contents())
    }

    /// Parse a DER SubjectPublicKeyInfo.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let (rest, spki) = SubjectPublicKeyInfo::from_der(der)
            .map_err(|e| RegistryError::InvalidInput(format!("malformed public key: {e}")))?;
        if !rest.is_empty() {
            return Err(RegistryError::InvalidInput(
                "trailing data after public key".into(),
            ));
        }

        let key_bytes: &[u8] = &spki.subject_public_key.data;
        let oid = spki.algorithm.algorithm.to_id_string();
        let algorithm = match (oid.as_str(), key_bytes.len()) {
            (OID_EC_PUBLIC_KEY, 65) => KeyAlgorithm::EcdsaP256,
            (OID_EC_PUBLIC_KEY, 97) => KeyAlgorithm::EcdsaP384,
            (OID_ED25519, 32) => KeyAlgorithm::Ed25519,
            _ => {
                return Err(RegistryError::InvalidInput(format!(
                    "unsupported public key (algorithm {oid}, {} bytes)",
                    key_bytes.len()
                )))
            }
        };

        // The prefix carries the curve OID, so this also rejects other
        // curves with the same point size (secp256k1).
        if !der.starts_with(algorithm.spki_prefix()) {
            return Err(RegistryError::InvalidInput(format!(
                "unsupported curve parameters for {algorithm} key"
            )));
        }

        Ok(Self {
            algorithm,
            bytes: key_bytes.to_vec(),
        })
    }

    /// Signature scheme of this key.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Check `signature` over `message`.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        UnparsedPublicKey::new(self.algorithm.verification(), &self.bytes)
            .verify(message, signature)
            .is_ok()
    }

    /// DER SubjectPublicKeyInfo encoding.
    #[must_use]
    pub fn to_spki_der(&self) -> Vec<u8> {
        let prefix = self.algorithm.spki_prefix();
        let mut der = Vec::with_capacity(prefix.len() + self.bytes.len());
        der.extend_from_slice(prefix);
        der.extend_from_slice(&self.bytes);
        der
    }

    /// PEM `PUBLIC KEY` encoding.
    #[must_use]
    pub fn to_pem(&self) -> String {
        pem::encode(&Pem::new("PUBLIC KEY", self.to_spki_der()))
    }
}

enum KeyPairInner {
    Ed25519(Ed25519KeyPair),
    EcdsaP256(EcdsaKeyPair),
}

/// A private key held by a network operator.
///
/// The registry never holds one; this exists for client tooling and tests.
pub struct SigningKey {
    inner: KeyPairInner,
    pkcs8: Vec<u8>,
    rng: SystemRandom,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Generate a new key pair.
    ///
    /// P-384 is verify-only: ring signs P-384 with SHA-384, which is not
    /// the registry's scheme.
    pub fn generate(algorithm: KeyAlgorithm) -> Result<Self> {
        let rng = SystemRandom::new();
        let document = match algorithm {
            KeyAlgorithm::Ed25519 => Ed25519KeyPair::generate_pkcs8(&rng),
            KeyAlgorithm::EcdsaP256 => {
                EcdsaKeyPair::generate_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            }
            KeyAlgorithm::EcdsaP384 => {
                return Err(RegistryError::InvalidInput(
                    "P-384 keys can be verified but not generated".into(),
                ))
            }
        }
        .map_err(|_| RegistryError::Internal("key generation failed".into()))?;
        Self::from_pkcs8(algorithm, document.as_ref())
    }

    /// Load a PKCS#8 DER key of a known algorithm.
    pub fn from_pkcs8(algorithm: KeyAlgorithm, der: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        let inner = match algorithm {
            KeyAlgorithm::Ed25519 => Ed25519KeyPair::from_pkcs8_maybe_unchecked(der)
                .map(KeyPairInner::Ed25519)
                .map_err(|e| RegistryError::InvalidInput(format!("bad Ed25519 key: {e}")))?,
            KeyAlgorithm::EcdsaP256 => {
                EcdsaKeyPair::from_pkcs8(&signature::ECDSA_P256_SHA256_ASN1_SIGNING, der, &rng)
                    .map(KeyPairInner::EcdsaP256)
                    .map_err(|e| RegistryError::InvalidInput(format!("bad P-256 key: {e}")))?
            }
            KeyAlgorithm::EcdsaP384 => {
                return Err(RegistryError::InvalidInput(
                    "P-384 signing keys are not supported".into(),
                ))
            }
        };
        Ok(Self {
            inner,
            pkcs8: der.to_vec(),
            rng,
        })
    }

    /// Load a PEM `PRIVATE KEY` block, detecting the algorithm.
    pub fn from_pem(text: &str) -> Result<Self> {
        let block = pem::parse(text.trim()).map_err(|e| {
            RegistryError::InvalidInput(format!("private key is not valid PEM: {e}"))
        })?;
        if block.tag() != "PRIVATE KEY" {
            return Err(RegistryError::InvalidInput(format!(
                "expected a PRIVATE KEY block, got {}",
                block.tag()
            )));
        }
        Self::from_pkcs8(KeyAlgorithm::Ed25519, block.contents())
            .or_else(|_| Self::from_pkcs8(KeyAlgorithm::EcdsaP256, block.contents()))
    }

    /// Signature scheme of this key.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        match self.inner {
            KeyPairInner::Ed25519(_) => KeyAlgorithm::Ed25519,
            KeyPairInner::EcdsaP256(_) => KeyAlgorithm::EcdsaP256,
        }
    }

    /// Matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        let bytes = match &self.inner {
            KeyPairInner::Ed25519(pair) => pair.public_key().as_ref().to_vec(),
            KeyPairInner::EcdsaP256(pair) => pair.public_key().as_ref().to_vec(),
        };
        PublicKey {
            algorithm: self.algorithm(),
            bytes,
        }
    }

    /// PEM `PRIVATE KEY` encoding.
    #[must_use]
    pub fn to_pem(&self) -> String {
        pem::encode(&Pem::new("PRIVATE KEY", self.pkcs8.clone()))
    }

    /// Sign raw bytes.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match &self.inner {
            KeyPairInner::Ed25519(pair) => Ok(pair.sign(message).as_ref().to_vec()),
            KeyPairInner::EcdsaP256(pair) => pair
                .sign(&self.rng, message)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|_| RegistryError::Internal("signing failed".into())),
        }
    }

    /// Sign the canonical serialization of `payload`; hex-encoded.
    pub fn sign_payload<T: Serialize + ?Sized>(&self, payload: &T) -> Result<String> {
        let message = canonical_bytes(payload)?;
        Ok(hex::encode(self.sign(&message)?))
    }
}
