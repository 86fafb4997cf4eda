//! The ledger: persisted chain state and tip tracking
//!
//! Owns the block store and the in-memory tip hash, and orchestrates
//! block creation and UTXO resolution. One writer per store handle;
//! callers serialize reads against writes.

use log::info;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

use super::ChainIterator;
use crate::consensus::{Block, PowError};
use crate::constants::TARGET_BITS;
use crate::crypto::{Hash, PrivateKey};
use crate::storage::{ChainDb, StoreError};
use crate::tx::{Transaction, TxError, TxOutput};

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pow(#[from] PowError),
    #[error(transparent)]
    Tx(#[from] TxError),
    #[error("transaction {0} not found in the chain")]
    TransactionNotFound(Hash),
    #[error("store has no chain")]
    NoChain,
}

/// The persisted chain and its current tip
pub struct Ledger {
    db: ChainDb,
    tip: Hash,
}

impl Ledger {
    /// Open the store, bootstrapping a chain if none exists.
    ///
    /// A fresh store gets a genesis block holding a single coinbase paying
    /// the subsidy to `genesis_address`. Re-opening an existing store
    /// never mutates it.
    pub fn open_or_create<P: AsRef<Path>>(
        path: P,
        genesis_address: &str,
    ) -> Result<Self, LedgerError> {
        let db = ChainDb::open(path)?;

        match db.tip()? {
            Some(tip) => Ok(Self { db, tip }),
            None => {
                let coinbase = Transaction::new_coinbase(genesis_address)?;
                let genesis = Block::seal(vec![coinbase], None, TARGET_BITS)?;
                db.append(&genesis)?;
                info!("created chain, genesis {}", genesis.hash);

                Ok(Self {
                    db,
                    tip: genesis.hash,
                })
            }
        }
    }

    /// Open an existing chain; fails with `NoChain` on an empty store
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = ChainDb::open(path)?;
        let tip = db.tip()?.ok_or(LedgerError::NoChain)?;
        Ok(Self { db, tip })
    }

    /// Hash of the most recently appended block
    pub fn tip(&self) -> Hash {
        self.tip
    }

    /// Seal the given transactions into a new block at the tip.
    ///
    /// The block write and the tip update commit atomically; the
    /// in-memory tip advances only after the store has.
    pub fn append_block(&mut self, transactions: Vec<Transaction>) -> Result<Block, LedgerError> {
        let tip = self.db.tip()?.ok_or(LedgerError::NoChain)?;
        let block = Block::seal(transactions, Some(tip), TARGET_BITS)?;

        self.db.append(&block)?;
        self.tip = block.hash;
        info!("appended block {}", block.hash);

        Ok(block)
    }

    /// Fresh cursor from the current tip back to genesis
    pub fn iterator(&self) -> ChainIterator<'_> {
        ChainIterator::new(&self.db, self.tip)
    }

    /// Walk the chain and collect, per transaction with unspent outputs
    /// for `pub_key_hash`, the indexes of those outputs.
    ///
    /// Iteration is tip to genesis, so a spending input is always
    /// recorded before the walk reaches the block that produced the
    /// spent output; filtering against the spent map is therefore exact.
    /// Results preserve chain order: blocks tip-first, transactions and
    /// outputs in insertion order.
    fn find_unspent(
        &self,
        pub_key_hash: &[u8; 20],
    ) -> Result<Vec<(Transaction, Vec<u32>)>, LedgerError> {
        let mut spent: HashMap<Hash, HashSet<u32>> = HashMap::new();
        let mut unspent = Vec::new();

        for block in self.iterator() {
            let block = block?;

            for tx in &block.transactions {
                let mut unspent_indexes = Vec::new();

                for (index, output) in tx.outputs.iter().enumerate() {
                    let index = index as u32;
                    if spent.get(&tx.id).map_or(false, |s| s.contains(&index)) {
                        continue;
                    }
                    if output.is_locked_with(pub_key_hash) {
                        unspent_indexes.push(index);
                    }
                }

                if !unspent_indexes.is_empty() {
                    unspent.push((tx.clone(), unspent_indexes));
                }

                // Coinbases have no inputs and record no spends
                if !tx.is_coinbase() {
                    for input in &tx.inputs {
                        if input.uses_key(pub_key_hash) {
                            spent.entry(input.prev_tx).or_default().insert(input.out_index);
                        }
                    }
                }
            }
        }

        Ok(unspent)
    }

    /// Transactions holding at least one unspent output for the address,
    /// each collected at most once, in chain order
    pub fn find_unspent_transactions(
        &self,
        pub_key_hash: &[u8; 20],
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .find_unspent(pub_key_hash)?
            .into_iter()
            .map(|(tx, _)| tx)
            .collect())
    }

    /// Select unspent outputs until `amount` is covered.
    ///
    /// Selection follows chain order and stops as soon as the
    /// accumulated value reaches the amount; the caller decides what an
    /// insufficient total means.
    pub fn find_spendable_outputs(
        &self,
        pub_key_hash: &[u8; 20],
        amount: u64,
    ) -> Result<(u64, Vec<(Hash, u32)>), LedgerError> {
        let mut accumulated = 0u64;
        let mut selected = Vec::new();

        'walk: for (tx, indexes) in self.find_unspent(pub_key_hash)? {
            for index in indexes {
                accumulated += tx.outputs[index as usize].value;
                selected.push((tx.id, index));

                if accumulated >= amount {
                    break 'walk;
                }
            }
        }

        Ok((accumulated, selected))
    }

    /// All unspent outputs for the address
    pub fn find_utxos(&self, pub_key_hash: &[u8; 20]) -> Result<Vec<TxOutput>, LedgerError> {
        let mut utxos = Vec::new();

        for (tx, indexes) in self.find_unspent(pub_key_hash)? {
            for index in indexes {
                utxos.push(tx.outputs[index as usize].clone());
            }
        }

        Ok(utxos)
    }

    /// Sum of unspent output values for the address
    pub fn get_balance(&self, pub_key_hash: &[u8; 20]) -> Result<u64, LedgerError> {
        Ok(self
            .find_utxos(pub_key_hash)?
            .iter()
            .map(|output| output.value)
            .sum())
    }

    /// Locate a transaction anywhere in the chain by id
    pub fn find_transaction(&self, id: &Hash) -> Result<Transaction, LedgerError> {
        for block in self.iterator() {
            let block = block?;
            for tx in block.transactions {
                if tx.id == *id {
                    return Ok(tx);
                }
            }
        }

        Err(LedgerError::TransactionNotFound(*id))
    }

    /// Referenced prior transactions keyed by raw id bytes
    fn prev_transactions(
        &self,
        tx: &Transaction,
    ) -> Result<HashMap<Hash, Transaction>, LedgerError> {
        let mut prev_txs = HashMap::new();

        for input in &tx.inputs {
            let prev_tx = self.find_transaction(&input.prev_tx)?;
            prev_txs.insert(prev_tx.id, prev_tx);
        }

        Ok(prev_txs)
    }

    /// Sign a transaction's inputs against their referenced outputs
    pub fn sign_transaction(
        &self,
        tx: &mut Transaction,
        private_key: &PrivateKey,
    ) -> Result<(), LedgerError> {
        let prev_txs = self.prev_transactions(tx)?;
        tx.sign(private_key, &prev_txs)?;
        Ok(())
    }

    /// Verify a transaction's input signatures against the chain
    pub fn verify_transaction(&self, tx: &Transaction) -> Result<bool, LedgerError> {
        if tx.is_coinbase() {
            return Ok(true);
        }

        let prev_txs = self.prev_transactions(tx)?;
        Ok(tx.verify(&prev_txs)?)
    }
}
