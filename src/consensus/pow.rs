//! Proof-of-work search and verification
//!
//! The target is the 256-bit integer `1 << (256 - TARGET_BITS)`. A nonce
//! is valid when the SHA-256 of the canonical header, read as a 256-bit
//! big-endian integer, is strictly below the target. `run` and `is_valid`
//! share one header encoder and one comparison, so the search's stopping
//! condition and the consensus check can never drift apart.

use log::debug;
use thiserror::Error;

use super::Block;
use crate::constants::MAX_NONCE;
use crate::crypto::{sha256, Hash};

/// Proof-of-work errors
#[derive(Debug, Error)]
pub enum PowError {
    #[error("nonce space exhausted without finding a valid hash")]
    NonceExhausted,
}

/// Proof-of-work context for one block at one difficulty
pub struct ProofOfWork<'a> {
    block: &'a Block,
    difficulty_bits: u32,
    target: [u8; 32],
}

impl<'a> ProofOfWork<'a> {
    /// Create a proof-of-work context
    pub fn new(block: &'a Block, difficulty_bits: u32) -> Self {
        Self {
            block,
            difficulty_bits,
            target: target_bytes(difficulty_bits),
        }
    }

    /// Canonical header bytes for a candidate nonce.
    ///
    /// Field order and widths are a bit-exactness contract shared by the
    /// mining and validation paths: transactions digest, previous hash
    /// (absent for genesis), then big-endian timestamp, difficulty bits,
    /// and nonce, joined with no separator.
    fn prepare_data(&self, nonce: i64) -> Vec<u8> {
        let mut data = Vec::with_capacity(32 + 32 + 8 + 4 + 8);
        data.extend_from_slice(&self.block.hash_transactions().0);
        if let Some(prev) = &self.block.prev_hash {
            data.extend_from_slice(&prev.0);
        }
        data.extend_from_slice(&self.block.timestamp.to_be_bytes());
        data.extend_from_slice(&self.difficulty_bits.to_be_bytes());
        data.extend_from_slice(&nonce.to_be_bytes());
        data
    }

    /// Search for a nonce whose header hash beats the target.
    ///
    /// Deterministic for identical header inputs; blocking and CPU-bound.
    pub fn run(&self) -> Result<(i64, Hash), PowError> {
        debug!(
            "mining block with {} transactions",
            self.block.transactions.len()
        );

        let mut nonce: i64 = 0;
        while nonce < MAX_NONCE {
            let hash = sha256(&self.prepare_data(nonce));
            if below_target(&hash, &self.target) {
                debug!("sealed with nonce {} hash {}", nonce, hash);
                return Ok((nonce, hash));
            }
            nonce += 1;
        }

        Err(PowError::NonceExhausted)
    }

    /// Recompute the header hash from the block's stored nonce and check
    /// it against the target with the exact comparison `run` uses.
    pub fn is_valid(&self) -> bool {
        let hash = sha256(&self.prepare_data(self.block.nonce));
        below_target(&hash, &self.target)
    }
}

/// 32-byte big-endian encoding of `1 << (256 - bits)`
fn target_bytes(bits: u32) -> [u8; 32] {
    debug_assert!((1..=255).contains(&bits));
    let shift = (256 - bits) as usize;
    let mut target = [0u8; 32];
    target[31 - shift / 8] = 1 << (shift % 8);
    target
}

/// Compare a hash to the target as 256-bit big-endian integers
fn below_target(hash: &Hash, target: &[u8; 32]) -> bool {
    for i in 0..32 {
        if hash.0[i] < target[i] {
            return true;
        }
        if hash.0[i] > target[i] {
            return false;
        }
    }
    // Equal is not below
    false
}
