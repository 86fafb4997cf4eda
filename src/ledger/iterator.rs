//! Backward-only chain cursor
//!
//! Walks persisted blocks from the tip toward genesis. The cursor
//! snapshots the tip hash at creation and is cheap to recreate for a
//! fresh scan; it is not shared across threads.

use super::LedgerError;
use crate::consensus::Block;
use crate::crypto::Hash;
use crate::storage::{ChainDb, StoreError};

/// Cursor over persisted blocks, tip to genesis
pub struct ChainIterator<'a> {
    db: &'a ChainDb,
    current: Option<Hash>,
}

impl<'a> ChainIterator<'a> {
    pub(crate) fn new(db: &'a ChainDb, tip: Hash) -> Self {
        Self {
            db,
            current: Some(tip),
        }
    }
}

impl Iterator for ChainIterator<'_> {
    type Item = Result<Block, LedgerError>;

    /// Yield the block at the cursor and step to its predecessor.
    ///
    /// Genesis is yielded last; its empty previous-hash link ends the
    /// iteration as a normal terminal condition. A hash that resolves to
    /// no block is store corruption, not the end of the chain.
    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current?;

        match self.db.get_block(&hash) {
            Ok(Some(block)) => {
                self.current = block.prev_hash;
                Some(Ok(block))
            }
            Ok(None) => {
                self.current = None;
                Some(Err(StoreError::Corrupt(format!(
                    "missing block {} reachable from tip",
                    hash
                ))
                .into()))
            }
            Err(err) => {
                self.current = None;
                Some(Err(err.into()))
            }
        }
    }
}
