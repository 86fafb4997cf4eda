//! Persistent block store backed by sled
//!
//! One tree holds both mappings: `block hash -> serialized block` and the
//! distinguished key `"l"` pointing at the current tip's hash. Appending
//! writes the block and moves the tip in a single sled transaction, so a
//! crash can never leave the tip pointing at an absent block.

use sled::transaction::TransactionError;
use sled::{Db, Tree};
use std::path::Path;
use thiserror::Error;

use crate::consensus::Block;
use crate::crypto::Hash;

const BLOCKS_TREE: &str = "blocks";
const TIP_KEY: &[u8] = b"l";

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Store(#[from] sled::Error),
    #[error("store transaction failed: {0}")]
    Transaction(String),
    #[error("corrupt store: {0}")]
    Corrupt(String),
    #[error("failed to encode block: {0}")]
    Encode(#[source] bincode::Error),
}

/// Handle to the on-disk chain store
pub struct ChainDb {
    db: Db,
    blocks: Tree,
}

impl ChainDb {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let blocks = db.open_tree(BLOCKS_TREE)?;
        Ok(Self { db, blocks })
    }

    /// The current tip hash, or `None` for a store with no chain
    pub fn tip(&self) -> Result<Option<Hash>, StoreError> {
        match self.blocks.get(TIP_KEY)? {
            Some(bytes) => {
                if bytes.len() != 32 {
                    return Err(StoreError::Corrupt(format!(
                        "tip pointer has {} bytes, expected 32",
                        bytes.len()
                    )));
                }
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&bytes);
                Ok(Some(Hash(arr)))
            }
            None => Ok(None),
        }
    }

    /// Fetch and decode a block by hash.
    ///
    /// Undecodable bytes are an error, never a fabricated default.
    pub fn get_block(&self, hash: &Hash) -> Result<Option<Block>, StoreError> {
        match self.blocks.get(hash.0)? {
            Some(bytes) => {
                let block = Block::deserialize(&bytes).map_err(|e| {
                    StoreError::Corrupt(format!("block {} failed to decode: {}", hash, e))
                })?;
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    /// Persist a block and advance the tip to it, atomically.
    ///
    /// Both writes commit together or roll back together.
    pub fn append(&self, block: &Block) -> Result<(), StoreError> {
        let bytes = block.serialize().map_err(StoreError::Encode)?;
        let hash = block.hash;

        self.blocks
            .transaction(|tree| {
                tree.insert(&hash.0[..], bytes.as_slice())?;
                tree.insert(TIP_KEY, &hash.0[..])?;
                Ok(())
            })
            .map_err(|err: TransactionError| StoreError::Transaction(format!("{:?}", err)))?;

        self.db.flush()?;
        Ok(())
    }
}
