//! Block structure and sealing
//!
//! A block is immutable once sealed: `seal` runs the proof-of-work search
//! synchronously and only ever returns a block whose hash satisfies the
//! difficulty target.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{PowError, ProofOfWork};
use crate::crypto::{sha256, Hash};
use crate::tx::Transaction;

/// A sealed block in the chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Seconds since the Unix epoch at sealing time
    pub timestamp: i64,
    /// Hash of the previous block; `None` only for the genesis root
    pub prev_hash: Option<Hash>,
    /// SHA-256 of the canonical header, below the difficulty target
    pub hash: Hash,
    /// Nonce found by the proof-of-work search
    pub nonce: i64,
    /// Transactions in insertion order
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Seal a new block over the given transactions.
    ///
    /// Runs the proof-of-work search to completion; the returned block
    /// always passes `ProofOfWork::is_valid` for the same difficulty.
    pub fn seal(
        transactions: Vec<Transaction>,
        prev_hash: Option<Hash>,
        difficulty_bits: u32,
    ) -> Result<Block, PowError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs() as i64;

        let mut block = Block {
            timestamp,
            prev_hash,
            hash: Hash::zero(),
            nonce: 0,
            transactions,
        };

        let (nonce, hash) = ProofOfWork::new(&block, difficulty_bits).run()?;
        block.nonce = nonce;
        block.hash = hash;

        Ok(block)
    }

    /// Whether this block is the chain root
    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_none()
    }

    /// Flat SHA-256 digest over the ordered transaction ids.
    ///
    /// Insertion order is significant: the digest commits to the exact
    /// sequence, not a set.
    pub fn hash_transactions(&self) -> Hash {
        let mut bytes = Vec::with_capacity(self.transactions.len() * 32);
        for tx in &self.transactions {
            bytes.extend_from_slice(&tx.id.0);
        }
        sha256(&bytes)
    }

    /// Encode for persistence
    pub fn serialize(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a persisted block
    pub fn deserialize(bytes: &[u8]) -> Result<Block, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
