//! Wallet module - addresses, key management, and key-file persistence

mod wallet;

pub use wallet::*;

use thiserror::Error;

use crate::constants::{ADDRESS_CHECKSUM_LEN, ADDRESS_VERSION};
use crate::crypto::address_checksum;

/// Address decoding errors
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("invalid base58 encoding")]
    InvalidEncoding,
    #[error("invalid address length")]
    InvalidLength,
    #[error("unsupported address version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

/// Encode a public key hash as a base58check address:
/// `base58(version || pub_key_hash || checksum)`
pub fn pub_key_hash_to_address(pub_key_hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(1 + pub_key_hash.len() + ADDRESS_CHECKSUM_LEN);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(pub_key_hash);

    let checksum = address_checksum(&payload);
    payload.extend_from_slice(&checksum);

    bs58::encode(payload).into_string()
}

/// Decode an address back to its 20-byte public key hash, verifying the
/// version byte and checksum
pub fn address_to_pub_key_hash(address: &str) -> Result<[u8; 20], AddressError> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|_| AddressError::InvalidEncoding)?;

    if decoded.len() != 1 + 20 + ADDRESS_CHECKSUM_LEN {
        return Err(AddressError::InvalidLength);
    }

    let (payload, checksum) = decoded.split_at(decoded.len() - ADDRESS_CHECKSUM_LEN);

    if payload[0] != ADDRESS_VERSION {
        return Err(AddressError::UnsupportedVersion(payload[0]));
    }
    if address_checksum(payload)[..] != *checksum {
        return Err(AddressError::ChecksumMismatch);
    }

    let mut pub_key_hash = [0u8; 20];
    pub_key_hash.copy_from_slice(&payload[1..]);
    Ok(pub_key_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip() {
        let pub_key_hash = [0xabu8; 20];
        let address = pub_key_hash_to_address(&pub_key_hash);
        assert_eq!(address_to_pub_key_hash(&address).unwrap(), pub_key_hash);
    }

    #[test]
    fn test_corrupted_address_fails_checksum() {
        let address = pub_key_hash_to_address(&[0x11u8; 20]);

        // Swap one base58 character for a different valid one
        let mut chars: Vec<char> = address.chars().collect();
        let i = chars.len() / 2;
        chars[i] = if chars[i] == '2' { '3' } else { '2' };
        let corrupted: String = chars.into_iter().collect();

        assert!(address_to_pub_key_hash(&corrupted).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            address_to_pub_key_hash("not base58 0OIl"),
            Err(AddressError::InvalidEncoding)
        ));
        assert!(matches!(
            address_to_pub_key_hash("2g"),
            Err(AddressError::InvalidLength)
        ));
    }
}
