//! Property-based tests for ledger invariants
//!
//! Verifies encoding and identity invariants hold under random inputs.

use proptest::prelude::*;

use lonechain::consensus::Block;
use lonechain::crypto::Hash;
use lonechain::tx::{Transaction, TxInput, TxOutput};
use lonechain::wallet::{address_to_pub_key_hash, pub_key_hash_to_address};

prop_compose! {
    fn arb_hash()(bytes in any::<[u8; 32]>()) -> Hash {
        Hash(bytes)
    }
}

prop_compose! {
    fn arb_output()(value in any::<u64>(), pub_key_hash in any::<[u8; 20]>()) -> TxOutput {
        TxOutput { value, pub_key_hash }
    }
}

prop_compose! {
    fn arb_input()(
        prev_tx in arb_hash(),
        out_index in any::<u32>(),
        signature in proptest::collection::vec(any::<u8>(), 0..=64),
        pub_key in proptest::collection::vec(any::<u8>(), 0..=64),
    ) -> TxInput {
        TxInput { prev_tx, out_index, signature, pub_key }
    }
}

prop_compose! {
    fn arb_transaction()(
        inputs in proptest::collection::vec(arb_input(), 0..4),
        outputs in proptest::collection::vec(arb_output(), 1..4),
    ) -> Transaction {
        Transaction::new(inputs, outputs)
    }
}

proptest! {
    /// A transaction id always equals the hash of its canonical encoding
    #[test]
    fn prop_tx_id_matches_encoding(tx in arb_transaction()) {
        prop_assert_eq!(tx.id, tx.compute_id());
    }

    /// Changing any output value changes the id
    #[test]
    fn prop_tx_id_commits_to_output_values(tx in arb_transaction(), delta in 1u64..1000) {
        let mut altered = tx.clone();
        altered.outputs[0].value = altered.outputs[0].value.wrapping_add(delta);
        prop_assert_ne!(tx.id, altered.compute_id());
    }

    /// The trimmed copy never changes outputs or input references
    #[test]
    fn prop_trimmed_copy_preserves_structure(tx in arb_transaction()) {
        let trimmed = tx.trimmed_copy();

        prop_assert_eq!(&trimmed.outputs, &tx.outputs);
        prop_assert_eq!(trimmed.inputs.len(), tx.inputs.len());
        for (trimmed_in, original_in) in trimmed.inputs.iter().zip(&tx.inputs) {
            prop_assert_eq!(trimmed_in.prev_tx, original_in.prev_tx);
            prop_assert_eq!(trimmed_in.out_index, original_in.out_index);
            prop_assert!(trimmed_in.signature.is_empty());
            prop_assert!(trimmed_in.pub_key.is_empty());
        }
    }

    /// Blocks round-trip through the wire format byte-for-byte
    #[test]
    fn prop_block_serialization_roundtrip(
        timestamp in any::<i64>(),
        prev_hash in proptest::option::of(arb_hash()),
        hash in arb_hash(),
        nonce in any::<i64>(),
        transactions in proptest::collection::vec(arb_transaction(), 0..3),
    ) {
        let block = Block { timestamp, prev_hash, hash, nonce, transactions };
        let decoded = Block::deserialize(&block.serialize().unwrap()).unwrap();

        prop_assert_eq!(&block, &decoded);
        // The genesis sentinel must survive distinctly from any real hash
        prop_assert_eq!(block.prev_hash.is_none(), decoded.prev_hash.is_none());
    }

    /// The transactions digest commits to transaction order
    #[test]
    fn prop_transactions_digest_order_sensitive(
        a in arb_transaction(),
        b in arb_transaction(),
    ) {
        prop_assume!(a.id != b.id);

        let block_ab = Block {
            timestamp: 0, prev_hash: None, hash: Hash::zero(), nonce: 0,
            transactions: vec![a.clone(), b.clone()],
        };
        let block_ba = Block {
            timestamp: 0, prev_hash: None, hash: Hash::zero(), nonce: 0,
            transactions: vec![b, a],
        };

        prop_assert_ne!(block_ab.hash_transactions(), block_ba.hash_transactions());
    }

    /// Addresses round-trip back to the public key hash they encode
    #[test]
    fn prop_address_roundtrip(pub_key_hash in any::<[u8; 20]>()) {
        let address = pub_key_hash_to_address(&pub_key_hash);
        prop_assert_eq!(address_to_pub_key_hash(&address).unwrap(), pub_key_hash);
    }

    /// Hash hex encoding round-trips
    #[test]
    fn prop_hash_hex_roundtrip(hash in arb_hash()) {
        prop_assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);
    }
}
