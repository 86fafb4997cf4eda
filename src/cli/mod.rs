//! Command-line surface
//!
//! Each command opens the store, performs one ledger operation, and
//! returns; failures surface as a non-zero process exit. The ledger
//! itself does not know the CLI exists.

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Single-node UTXO ledger with proof-of-work sealed blocks
#[derive(Parser)]
#[command(name = "lonechain", version)]
pub struct Cli {
    /// Data directory for the chain store and wallet file
    #[arg(long, default_value = ".lonechain")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a ledger, paying the genesis subsidy to an address
    #[command(name = "createledger")]
    CreateLedger {
        /// Address receiving the genesis coinbase
        #[arg(long)]
        address: String,
    },

    /// Print every block from the tip back to genesis
    #[command(name = "printchain")]
    PrintChain,

    /// Show the balance of an address
    #[command(name = "getbalance")]
    GetBalance {
        /// Address to query
        #[arg(long)]
        address: String,
    },

    /// Send value from an owned address to another address
    #[command(name = "send")]
    Send {
        /// Sending address; its key must be in the wallet file
        #[arg(long)]
        from: String,

        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount to transfer
        #[arg(long)]
        amount: u64,
    },

    /// Generate a new key pair and print its address
    #[command(name = "createwallet")]
    CreateWallet,

    /// List addresses held in the wallet file
    #[command(name = "listaddresses")]
    ListAddresses,
}
