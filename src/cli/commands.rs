//! Command handlers
//!
//! One function per subcommand, each a full open-act-close cycle over
//! the store.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Cli, Command};
use crate::consensus::ProofOfWork;
use crate::constants::TARGET_BITS;
use crate::ledger::Ledger;
use crate::tx::new_utxo_transaction;
use crate::wallet::{address_to_pub_key_hash, Wallets};

/// Result type for CLI operations
pub type CliResult = Result<(), Box<dyn Error>>;

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> CliResult {
    fs::create_dir_all(&cli.data_dir)?;
    let paths = DataPaths::new(&cli.data_dir);

    match cli.command {
        Command::CreateLedger { address } => cmd_create_ledger(&paths, &address),
        Command::PrintChain => cmd_print_chain(&paths),
        Command::GetBalance { address } => cmd_get_balance(&paths, &address),
        Command::Send { from, to, amount } => cmd_send(&paths, &from, &to, amount),
        Command::CreateWallet => cmd_create_wallet(&paths),
        Command::ListAddresses => cmd_list_addresses(&paths),
    }
}

struct DataPaths {
    chain: PathBuf,
    wallets: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        Self {
            chain: data_dir.join("chain"),
            wallets: data_dir.join("wallets.dat"),
        }
    }
}

fn cmd_create_ledger(paths: &DataPaths, address: &str) -> CliResult {
    // Reject a bad address before touching the store
    address_to_pub_key_hash(address)?;

    let ledger = Ledger::open_or_create(&paths.chain, address)?;
    println!("ledger ready, tip {}", ledger.tip());
    Ok(())
}

fn cmd_print_chain(paths: &DataPaths) -> CliResult {
    let ledger = Ledger::open(&paths.chain)?;

    for block in ledger.iterator() {
        let block = block?;

        println!("block {}", block.hash);
        match &block.prev_hash {
            Some(prev) => println!("  prev:      {}", prev),
            None => println!("  prev:      (genesis)"),
        }
        println!("  timestamp: {}", block.timestamp);
        println!("  nonce:     {}", block.nonce);
        println!(
            "  pow valid: {}",
            ProofOfWork::new(&block, TARGET_BITS).is_valid()
        );
        for tx in &block.transactions {
            print!("{}", tx);
        }
        println!();
    }

    Ok(())
}

fn cmd_get_balance(paths: &DataPaths, address: &str) -> CliResult {
    let pub_key_hash = address_to_pub_key_hash(address)?;
    let ledger = Ledger::open(&paths.chain)?;

    let balance = ledger.get_balance(&pub_key_hash)?;
    println!("balance of {}: {}", address, balance);
    Ok(())
}

fn cmd_send(paths: &DataPaths, from: &str, to: &str, amount: u64) -> CliResult {
    let wallets = Wallets::open(&paths.wallets)?;
    let keypair = wallets
        .get(from)
        .ok_or_else(|| format!("address {} is not in the wallet file", from))?;

    let mut ledger = Ledger::open(&paths.chain)?;

    let mut tx = new_utxo_transaction(from, to, amount, &ledger)?;
    ledger.sign_transaction(&mut tx, keypair.private_key())?;

    if !ledger.verify_transaction(&tx)? {
        return Err("transaction failed signature verification".into());
    }

    let block = ledger.append_block(vec![tx])?;
    println!("sent {} from {} to {}", amount, from, to);
    println!("sealed block {}", block.hash);
    Ok(())
}

fn cmd_create_wallet(paths: &DataPaths) -> CliResult {
    let mut wallets = Wallets::open(&paths.wallets)?;
    let keypair = wallets.create_key()?;
    println!("new address: {}", keypair.address);
    Ok(())
}

fn cmd_list_addresses(paths: &DataPaths) -> CliResult {
    let wallets = Wallets::open(&paths.wallets)?;

    for address in wallets.addresses() {
        println!("{}", address);
    }
    Ok(())
}
