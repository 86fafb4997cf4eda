//! SHA-256 hashing primitives
//!
//! Every 32-byte digest in the ledger (block hashes, transaction ids)
//! is a SHA-256 output wrapped in the `Hash` newtype.

use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::constants::ADDRESS_CHECKSUM_LEN;

/// 32-byte hash output
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// Create a zero hash
    pub const fn zero() -> Self {
        Hash([0u8; 32])
    }

    /// Create hash from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    /// Create hash from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

/// Hash arbitrary bytes with SHA-256
pub fn sha256(data: &[u8]) -> Hash {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Hash(out)
}

/// Double SHA-256 (hash of hash), used for address checksums
pub fn double_sha256(data: &[u8]) -> Hash {
    let first = sha256(data);
    sha256(&first.0)
}

/// Digest a public key into its 20-byte address form: RIPEMD160(SHA256(key))
pub fn hash_pub_key(pub_key: &[u8]) -> [u8; 20] {
    let sha = sha256(pub_key);
    let ripemd = Ripemd160::digest(sha.0);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd);
    out
}

/// First `ADDRESS_CHECKSUM_LEN` bytes of the double SHA-256 of a payload
pub fn address_checksum(payload: &[u8]) -> [u8; ADDRESS_CHECKSUM_LEN] {
    let digest = double_sha256(payload);
    let mut out = [0u8; ADDRESS_CHECKSUM_LEN];
    out.copy_from_slice(&digest.0[..ADDRESS_CHECKSUM_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello world";
        let hash1 = sha256(data);
        let hash2 = sha256(data);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_inputs() {
        let hash1 = sha256(b"hello");
        let hash2 = sha256(b"world");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_known_vector() {
        // SHA-256 of the empty string
        let hash = sha256(b"");
        assert_eq!(
            hash.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_zero_hash() {
        let zero = Hash::zero();
        assert_eq!(zero.0, [0u8; 32]);
    }

    #[test]
    fn test_hex_roundtrip() {
        let hash = sha256(b"test");
        let hex = hash.to_hex();
        let recovered = Hash::from_hex(&hex).unwrap();
        assert_eq!(hash, recovered);
    }

    #[test]
    fn test_double_sha256_differs_from_single() {
        let data = b"checksum input";
        assert_ne!(sha256(data), double_sha256(data));
    }

    #[test]
    fn test_hash_pub_key_length_and_determinism() {
        let key = [7u8; 64];
        let digest1 = hash_pub_key(&key);
        let digest2 = hash_pub_key(&key);
        assert_eq!(digest1, digest2);
        assert_eq!(digest1.len(), 20);
    }

    #[test]
    fn test_checksum_changes_with_payload() {
        let a = address_checksum(b"payload a");
        let b = address_checksum(b"payload b");
        assert_ne!(a, b);
    }
}
