//! lonechain command-line entry point

use clap::Parser;
use lonechain::cli::{self, Cli};
use std::process;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = cli::run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
