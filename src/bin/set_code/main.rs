//! setcode - Pin every card of a deck list to a specific printing.
//!
//! Looks up the printing that proxyprint would download for each card
//! and writes a copy of the deck with the set code and collector number added.

mod config;
mod set_code;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::set_code::SetCode;

/// Pin every card of a deck list to a specific printing.
///
/// Writes a copy of the deck where every card line ends with `(SET) number`,
/// using the same printing preference as proxyprint.
#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Pin every card of a deck list to a specific printing"
)]
pub struct SetCodeArgs {
    /// Deck file, or file name inside the decks directory
    #[arg(value_hint = clap::ValueHint::FilePath, required_unless_present = "completion")]
    deck: Option<PathBuf>,

    /// Output directory [default: <deck dir>/set_added]
    #[arg(short = 'o', long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    output: Option<PathBuf>,

    /// Directory to look for the deck file in
    #[arg(short = 'd', long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    decks: Option<PathBuf>,

    /// Overwrite an existing output file without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Delay after each API request in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Generate shell completion
    #[arg(short = 'l', long, value_name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = SetCodeArgs::parse();
    if let Some(ref shell) = args.completion {
        proxy_printer::generate_shell_completion(*shell, SetCodeArgs::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        SetCode::new(&args)?.run().await
    }
}
