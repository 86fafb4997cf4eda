//! ECDSA signing over secp256k1
//!
//! Keys and signatures travel as raw coordinate bytes: public keys are the
//! 64-byte `x || y` point encoding, signatures the 64-byte `r || s` scalar
//! pair. Signing operates on precomputed 32-byte digests.

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use super::Hash;

/// Length of a raw `x || y` public key
pub const PUBLIC_KEY_LEN: usize = 64;

/// Length of a raw `r || s` signature
pub const SIGNATURE_LEN: usize = 64;

/// Signature errors
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid public key")]
    InvalidPublicKey,
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// secp256k1 private key
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

impl PrivateKey {
    /// Generate a new random private key
    pub fn generate() -> Self {
        PrivateKey(SigningKey::random(&mut OsRng))
    }

    /// Create from a 32-byte scalar
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, SignatureError> {
        SigningKey::from_slice(bytes)
            .map(PrivateKey)
            .map_err(|_| SignatureError::InvalidPrivateKey)
    }

    /// Export the 32-byte scalar
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes().into()
    }

    /// The corresponding public key as raw `x || y` bytes
    pub fn public_key(&self) -> Vec<u8> {
        let point = self.0.verifying_key().to_encoded_point(false);
        // Drop the SEC1 uncompressed tag byte, keeping the two coordinates
        point.as_bytes()[1..].to_vec()
    }

    /// Sign a 32-byte digest, returning the `r || s` concatenation
    pub fn sign_digest(&self, digest: &Hash) -> Result<Vec<u8>, SignatureError> {
        let signature: Signature = self
            .0
            .sign_prehash(&digest.0)
            .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }
}

/// Verify an `r || s` signature over a digest against a raw `x || y` key.
///
/// Malformed keys or signatures verify as `false` rather than erroring:
/// the bytes came from an untrusted transaction input.
pub fn verify_digest(pub_key: &[u8], digest: &Hash, signature: &[u8]) -> bool {
    if pub_key.len() != PUBLIC_KEY_LEN || signature.len() != SIGNATURE_LEN {
        return false;
    }

    // Rebuild the SEC1 uncompressed point from the x and y halves
    let mut sec1 = Vec::with_capacity(PUBLIC_KEY_LEN + 1);
    sec1.push(0x04);
    sec1.extend_from_slice(pub_key);

    let verifying_key = match VerifyingKey::from_sec1_bytes(&sec1) {
        Ok(vk) => vk,
        Err(_) => return false,
    };

    let signature = match Signature::from_slice(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    verifying_key.verify_prehash(&digest.0, &signature).is_ok()
}
