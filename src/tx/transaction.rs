//! Transaction structure, canonical encoding, and signing
//!
//! A transaction spends previously created outputs and creates new ones.
//! Its id is the SHA-256 of a canonical byte encoding of inputs and
//! outputs, computed once at construction. Signing follows a per-input
//! trimmed-copy protocol: each input is signed over a digest derived from
//! a copy of the transaction with all authorization fields cleared and
//! only that input's `pub_key` slot carrying the referenced output's
//! public key hash.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::constants::SUBSIDY;
use crate::crypto::{hash_pub_key, sha256, verify_digest, Hash, PrivateKey, SignatureError};
use crate::ledger::{Ledger, LedgerError};
use crate::wallet::{address_to_pub_key_hash, AddressError};

/// Transaction errors
#[derive(Debug, Error)]
pub enum TxError {
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("referenced transaction {0} not found")]
    PrevTxNotFound(Hash),
    #[error("input references missing output {index} of transaction {tx}")]
    OutputIndexOutOfRange { tx: Hash, index: u32 },
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// A transaction input referencing one prior output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Id of the transaction containing the referenced output
    pub prev_tx: Hash,
    /// Index of the referenced output in that transaction
    pub out_index: u32,
    /// `r || s` signature; empty until signed
    pub signature: Vec<u8>,
    /// Spender's raw `x || y` public key; empty until signed
    pub pub_key: Vec<u8>,
}

impl TxInput {
    /// Whether this input was signed by the key hashing to `pub_key_hash`
    pub fn uses_key(&self, pub_key_hash: &[u8; 20]) -> bool {
        hash_pub_key(&self.pub_key) == *pub_key_hash
    }
}

/// A transaction output holding value locked to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in base units
    pub value: u64,
    /// Public key hash of the owner
    pub pub_key_hash: [u8; 20],
}

impl TxOutput {
    /// Create an output locked to the given address
    pub fn locked(value: u64, address: &str) -> Result<Self, AddressError> {
        Ok(Self {
            value,
            pub_key_hash: address_to_pub_key_hash(address)?,
        })
    }

    /// Whether this output is spendable by the given public key hash
    pub fn is_locked_with(&self, pub_key_hash: &[u8; 20]) -> bool {
        self.pub_key_hash == *pub_key_hash
    }
}

/// A complete transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// SHA-256 of the canonical encoding of inputs and outputs
    pub id: Hash,
    /// Inputs, empty for a coinbase
    pub inputs: Vec<TxInput>,
    /// Outputs in creation order
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Create a transaction from parts, computing its id
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let mut tx = Self {
            id: Hash::zero(),
            inputs,
            outputs,
        };
        tx.id = tx.compute_id();
        tx
    }

    /// Create a coinbase transaction minting the block subsidy to `to`
    pub fn new_coinbase(to: &str) -> Result<Self, TxError> {
        let output = TxOutput::locked(SUBSIDY, to)?;
        Ok(Self::new(Vec::new(), vec![output]))
    }

    /// A coinbase has no inputs
    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Canonical byte encoding of inputs and outputs.
    ///
    /// Fields are concatenated in order with no separators: per input
    /// `prev_tx(32) || out_index u32 BE || signature || pub_key`, per
    /// output `value u64 BE || pub_key_hash(20)`.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        for input in &self.inputs {
            bytes.extend_from_slice(&input.prev_tx.0);
            bytes.extend_from_slice(&input.out_index.to_be_bytes());
            bytes.extend_from_slice(&input.signature);
            bytes.extend_from_slice(&input.pub_key);
        }

        for output in &self.outputs {
            bytes.extend_from_slice(&output.value.to_be_bytes());
            bytes.extend_from_slice(&output.pub_key_hash);
        }

        bytes
    }

    /// Compute the transaction id over the canonical encoding
    pub fn compute_id(&self) -> Hash {
        sha256(&self.canonical_bytes())
    }

    /// Copy with all input authorization fields cleared.
    ///
    /// The trimmed copy is the basis for every signing digest; outputs and
    /// input references are preserved byte-for-byte.
    pub fn trimmed_copy(&self) -> Transaction {
        let inputs = self
            .inputs
            .iter()
            .map(|input| TxInput {
                prev_tx: input.prev_tx,
                out_index: input.out_index,
                signature: Vec::new(),
                pub_key: Vec::new(),
            })
            .collect();

        Transaction {
            id: self.id,
            inputs,
            outputs: self.outputs.clone(),
        }
    }

    /// Sign every input with the spender's private key.
    ///
    /// `prev_txs` must contain each referenced transaction, keyed by id.
    /// Each input is signed over its own trimmed-copy digest, then the
    /// real input receives the signature and the spender's public key.
    pub fn sign(
        &mut self,
        private_key: &PrivateKey,
        prev_txs: &HashMap<Hash, Transaction>,
    ) -> Result<(), TxError> {
        if self.is_coinbase() {
            return Ok(());
        }

        let mut trimmed = self.trimmed_copy();
        let pub_key = private_key.public_key();

        for index in 0..self.inputs.len() {
            let digest = input_digest(&mut trimmed, index, prev_txs)?;
            let signature = private_key.sign_digest(&digest)?;

            self.inputs[index].signature = signature;
            self.inputs[index].pub_key = pub_key.clone();
        }

        Ok(())
    }

    /// Verify every input signature.
    ///
    /// Mirrors `sign`: the digest for each input is rederived from the
    /// trimmed copy, and the stored `r || s` signature is checked against
    /// the stored `x || y` public key. Returns `Ok(false)` on the first
    /// failing input; a coinbase verifies trivially.
    pub fn verify(&self, prev_txs: &HashMap<Hash, Transaction>) -> Result<bool, TxError> {
        if self.is_coinbase() {
            return Ok(true);
        }

        let mut trimmed = self.trimmed_copy();

        for (index, input) in self.inputs.iter().enumerate() {
            let digest = input_digest(&mut trimmed, index, prev_txs)?;

            if !verify_digest(&input.pub_key, &digest, &input.signature) {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Digest for one input: the trimmed copy's id with that input's `pub_key`
/// temporarily set to the referenced output's public key hash.
fn input_digest(
    trimmed: &mut Transaction,
    index: usize,
    prev_txs: &HashMap<Hash, Transaction>,
) -> Result<Hash, TxError> {
    let prev_id = trimmed.inputs[index].prev_tx;
    let prev_tx = prev_txs
        .get(&prev_id)
        .ok_or(TxError::PrevTxNotFound(prev_id))?;

    let out_index = trimmed.inputs[index].out_index;
    let referenced = prev_tx
        .outputs
        .get(out_index as usize)
        .ok_or(TxError::OutputIndexOutOfRange {
            tx: prev_id,
            index: out_index,
        })?;

    trimmed.inputs[index].signature.clear();
    trimmed.inputs[index].pub_key = referenced.pub_key_hash.to_vec();
    let digest = trimmed.compute_id();
    trimmed.inputs[index].pub_key.clear();

    Ok(digest)
}

/// Build an unsigned transaction moving `amount` from `from` to `to`.
///
/// Selects spendable outputs in chain order, adds a change output back to
/// `from` when the selection overshoots, and leaves all inputs unsigned.
pub fn new_utxo_transaction(
    from: &str,
    to: &str,
    amount: u64,
    ledger: &Ledger,
) -> Result<Transaction, LedgerError> {
    let from_pub_key_hash = address_to_pub_key_hash(from).map_err(TxError::from)?;
    let (accumulated, selected) = ledger.find_spendable_outputs(&from_pub_key_hash, amount)?;

    if accumulated < amount {
        return Err(TxError::InsufficientFunds {
            have: accumulated,
            need: amount,
        }
        .into());
    }

    let inputs = selected
        .into_iter()
        .map(|(prev_tx, out_index)| TxInput {
            prev_tx,
            out_index,
            signature: Vec::new(),
            pub_key: Vec::new(),
        })
        .collect();

    let mut outputs = vec![TxOutput::locked(amount, to).map_err(TxError::from)?];
    if accumulated > amount {
        outputs.push(TxOutput::locked(accumulated - amount, from).map_err(TxError::from)?);
    }

    Ok(Transaction::new(inputs, outputs))
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "transaction {}", self.id)?;
        for (i, input) in self.inputs.iter().enumerate() {
            writeln!(f, "  input {}:", i)?;
            writeln!(f, "    prev tx:   {}", input.prev_tx)?;
            writeln!(f, "    out index: {}", input.out_index)?;
            writeln!(f, "    signature: {}", hex::encode(&input.signature))?;
            writeln!(f, "    pub key:   {}", hex::encode(&input.pub_key))?;
        }
        for (i, output) in self.outputs.iter().enumerate() {
            writeln!(f, "  output {}:", i)?;
            writeln!(f, "    value:    {}", output.value)?;
            writeln!(f, "    locked to: {}", hex::encode(output.pub_key_hash))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;

    fn keyed_output(value: u64, private_key: &PrivateKey) -> TxOutput {
        TxOutput {
            value,
            pub_key_hash: hash_pub_key(&private_key.public_key()),
        }
    }

    /// A prior transaction plus a signed spend of its first output.
    fn signed_spend(owner: &PrivateKey) -> (HashMap<Hash, Transaction>, Transaction) {
        let prev = Transaction::new(Vec::new(), vec![keyed_output(50, owner)]);

        let mut prev_txs = HashMap::new();
        prev_txs.insert(prev.id, prev.clone());

        let mut tx = Transaction::new(
            vec![TxInput {
                prev_tx: prev.id,
                out_index: 0,
                signature: Vec::new(),
                pub_key: Vec::new(),
            }],
            vec![keyed_output(50, &PrivateKey::generate())],
        );
        tx.sign(owner, &prev_txs).unwrap();

        (prev_txs, tx)
    }

    #[test]
    fn test_coinbase_detection() {
        let tx = Transaction::new(Vec::new(), vec![keyed_output(10, &PrivateKey::generate())]);
        assert!(tx.is_coinbase());

        let (_, spend) = signed_spend(&PrivateKey::generate());
        assert!(!spend.is_coinbase());
    }

    #[test]
    fn test_id_deterministic() {
        let owner = PrivateKey::generate();
        let tx = Transaction::new(Vec::new(), vec![keyed_output(10, &owner)]);
        assert_eq!(tx.id, tx.compute_id());
    }

    #[test]
    fn test_id_depends_on_output_order() {
        let a = keyed_output(1, &PrivateKey::generate());
        let b = keyed_output(2, &PrivateKey::generate());

        let tx1 = Transaction::new(Vec::new(), vec![a.clone(), b.clone()]);
        let tx2 = Transaction::new(Vec::new(), vec![b, a]);
        assert_ne!(tx1.id, tx2.id);
    }

    #[test]
    fn test_trimmed_copy_clears_authorization() {
        let (_, tx) = signed_spend(&PrivateKey::generate());
        let trimmed = tx.trimmed_copy();

        assert_eq!(trimmed.inputs.len(), tx.inputs.len());
        for input in &trimmed.inputs {
            assert!(input.signature.is_empty());
            assert!(input.pub_key.is_empty());
        }
        assert_eq!(trimmed.outputs, tx.outputs);
    }

    #[test]
    fn test_sign_then_verify() {
        let owner = PrivateKey::generate();
        let (prev_txs, tx) = signed_spend(&owner);

        assert!(tx.verify(&prev_txs).unwrap());
    }

    #[test]
    fn test_sign_sets_spender_pub_key() {
        let owner = PrivateKey::generate();
        let (_, tx) = signed_spend(&owner);

        assert_eq!(tx.inputs[0].pub_key, owner.public_key());
        assert_eq!(tx.inputs[0].signature.len(), 64);
    }

    #[test]
    fn test_flipped_signature_fails_verification() {
        let owner = PrivateKey::generate();
        let (prev_txs, mut tx) = signed_spend(&owner);

        tx.inputs[0].signature[3] ^= 0x01;
        assert!(!tx.verify(&prev_txs).unwrap());
    }

    #[test]
    fn test_tampered_output_fails_verification() {
        let owner = PrivateKey::generate();
        let (prev_txs, mut tx) = signed_spend(&owner);

        tx.outputs[0].value += 1;
        assert!(!tx.verify(&prev_txs).unwrap());
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let owner = PrivateKey::generate();
        let (prev_txs, mut tx) = signed_spend(&owner);

        // Replace the stored key with another one; the signature no longer matches
        tx.inputs[0].pub_key = PrivateKey::generate().public_key();
        assert!(!tx.verify(&prev_txs).unwrap());
    }

    #[test]
    fn test_coinbase_verifies_trivially() {
        let tx = Transaction::new(Vec::new(), vec![keyed_output(10, &PrivateKey::generate())]);
        assert!(tx.verify(&HashMap::new()).unwrap());
    }

    #[test]
    fn test_missing_prev_tx_propagates() {
        let owner = PrivateKey::generate();
        let (_, tx) = signed_spend(&owner);

        let err = tx.verify(&HashMap::new()).unwrap_err();
        assert!(matches!(err, TxError::PrevTxNotFound(_)));
    }
}
