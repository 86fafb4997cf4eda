//! Transaction model - UTXO transactions with ECDSA authorization

mod transaction;

pub use transaction::*;
