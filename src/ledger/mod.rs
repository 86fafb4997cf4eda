//! Ledger module - persisted chain state, UTXO resolution, and iteration

mod chain;
mod iterator;

pub use chain::*;
pub use iterator::*;
