//! Key generation and the wallet key file
//!
//! Keys never affect consensus; the wallet only supplies the private key
//! the signer uses and the address text other components consume.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::pub_key_hash_to_address;
use crate::crypto::{hash_pub_key, PrivateKey, SignatureError};

/// Wallet errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Key(#[from] SignatureError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wallet file codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// A key pair with its derived address
#[derive(Debug)]
pub struct KeyPair {
    private_key: PrivateKey,
    /// Raw `x || y` public key
    pub public_key: Vec<u8>,
    /// Base58check address derived from the public key
    pub address: String,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_private_key(PrivateKey::generate())
    }

    /// Rebuild a key pair from a stored secret scalar
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, SignatureError> {
        Ok(Self::from_private_key(PrivateKey::from_bytes(bytes)?))
    }

    fn from_private_key(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        let address = pub_key_hash_to_address(&hash_pub_key(&public_key));
        Self {
            private_key,
            public_key,
            address,
        }
    }

    /// The signing key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The 20-byte hash outputs lock to
    pub fn pub_key_hash(&self) -> [u8; 20] {
        hash_pub_key(&self.public_key)
    }
}

/// Secret scalars keyed by address, the on-disk wallet format
#[derive(Serialize, Deserialize)]
struct WalletFile {
    secrets: HashMap<String, [u8; 32]>,
}

/// The set of keys known to this node, persisted to one file
pub struct Wallets {
    keys: HashMap<String, KeyPair>,
    path: PathBuf,
}

impl Wallets {
    /// Load the wallet file, or start empty if it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let path = path.as_ref().to_path_buf();
        let mut keys = HashMap::new();

        if path.exists() {
            let mut bytes = Vec::new();
            File::open(&path)?.read_to_end(&mut bytes)?;
            let file: WalletFile = bincode::deserialize(&bytes)?;

            for secret in file.secrets.values() {
                let keypair = KeyPair::from_secret_bytes(secret)?;
                keys.insert(keypair.address.clone(), keypair);
            }
        }

        Ok(Self { keys, path })
    }

    /// Generate a new key, persist it, and return it
    pub fn create_key(&mut self) -> Result<&KeyPair, WalletError> {
        let keypair = KeyPair::generate();
        let address = keypair.address.clone();
        self.keys.insert(address.clone(), keypair);
        self.save()?;

        Ok(&self.keys[&address])
    }

    /// Look up the key pair for an address
    pub fn get(&self, address: &str) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    /// All known addresses, sorted for stable output
    pub fn addresses(&self) -> Vec<&str> {
        let mut addresses: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        addresses.sort_unstable();
        addresses
    }

    fn save(&self) -> Result<(), WalletError> {
        let file = WalletFile {
            secrets: self
                .keys
                .iter()
                .map(|(address, keypair)| (address.clone(), keypair.private_key().to_bytes()))
                .collect(),
        };

        let bytes = bincode::serialize(&file)?;
        File::create(&self.path)?.write_all(&bytes)?;
        Ok(())
    }
}
