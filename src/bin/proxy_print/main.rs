//! proxyprint - Create printable proxy sheets from a deck list.
//!
//! Downloads missing card images from Scryfall and writes two PDF files:
//! a print sheet with nine cards per page and a single page overview.

mod config;
mod printer;

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use proxy_printer::layout::PageSize;
use proxy_printer::render::MissingImage;

use crate::printer::ProxyPrinter;

/// Create printable proxy sheets from a deck list.
///
/// Every deck line is `<amount> <card name>`.
/// Card images are downloaded to the images directory if they are not there yet,
/// then a print sheet and an overview sheet are written as PDF files.
#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Create printable proxy sheets from a deck list"
)]
pub struct ProxyPrintArgs {
    /// Deck file, or file name inside the decks directory
    #[arg(value_hint = clap::ValueHint::FilePath, required_unless_present = "completion")]
    deck: Option<PathBuf>,

    /// Output directory for PDF files
    #[arg(short = 'o', long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    output: Option<PathBuf>,

    /// Card image directory
    #[arg(short = 'i', long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    images: Option<PathBuf>,

    /// Directory to look for the deck file in
    #[arg(short = 'd', long, value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    decks: Option<PathBuf>,

    /// Paper size
    #[arg(short = 's', long, value_enum, value_name = "SIZE")]
    page_size: Option<PageSize>,

    /// Card width in millimetres
    #[arg(long, value_name = "MM")]
    card_width: Option<f32>,

    /// Card height in millimetres
    #[arg(long, value_name = "MM")]
    card_height: Option<f32>,

    /// Horizontal spacing around each card in millimetres
    #[arg(long, value_name = "MM")]
    spacing_x: Option<f32>,

    /// Vertical spacing around each card in millimetres
    #[arg(long, value_name = "MM")]
    spacing_y: Option<f32>,

    /// Page background colour, for example "#1a1a1a" or "white"
    #[arg(short = 'c', long, value_name = "COLOR")]
    fill: Option<String>,

    /// What to do with cards that have no image
    #[arg(short = 'm', long, value_enum, value_name = "POLICY")]
    missing: Option<MissingImage>,

    /// Delay after each API request in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Only use local images, do not download anything
    #[arg(short = 'n', long)]
    offline: bool,

    /// Do not create the overview sheet
    #[arg(long)]
    no_overview: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, value_name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ProxyPrintArgs::parse();
    if let Some(ref shell) = args.completion {
        proxy_printer::generate_shell_completion(*shell, ProxyPrintArgs::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        ProxyPrinter::new(&args)?.run().await
    }
}
