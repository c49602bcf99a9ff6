use std::path::Path;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use proxy_printer::deck::Deck;
use proxy_printer::fetch::{CardLookup, ImageFetcher, ImageStore};
use proxy_printer::pdf::SheetDocument;
use proxy_printer::print_warning;
use proxy_printer::render;
use proxy_printer::scryfall::ScryfallClient;

use crate::ProxyPrintArgs;
use crate::config::Config;

/// Output file suffix for the print sheet.
const PRINT_SUFFIX: &str = "print";

/// Output file suffix for the overview sheet.
const OVERVIEW_SUFFIX: &str = "overview";

/// Runs the full pipeline for one deck: parse, fetch, render.
pub struct ProxyPrinter {
    config: Config,
}

impl ProxyPrinter {
    /// Create a new proxy printer from command line arguments.
    pub fn new(args: &ProxyPrintArgs) -> Result<Self> {
        Ok(Self {
            config: Config::from_args(args)?,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let deck = Deck::from_file(&self.config.deck_path)?;
        if deck.is_empty() {
            bail!("No cards found in deck: {}", self.config.deck_path.display());
        }

        println!(
            "{}",
            format!(
                "{}: {} cards, {} distinct",
                proxy_printer::path_to_file_stem_string(&self.config.deck_path),
                deck.len(),
                deck.distinct().len()
            )
            .bold()
        );

        let store = ImageStore::new(&self.config.images_dir);
        if self.config.offline {
            if self.config.verbose {
                println!("Offline mode, using images from {}", store.dir().display());
            }
        } else {
            self.fetch_images(&deck, store.clone()).await?;
        }

        let deck = render::apply_missing_policy(&deck, &store, self.config.missing)?;
        if deck.is_empty() {
            bail!("No cards left to print");
        }

        proxy_printer::ensure_dir(&self.config.output_dir)?;

        let print_path = proxy_printer::output_file_path(&self.config.output_dir, &self.config.deck_path, PRINT_SUFFIX);
        let document = render::print_sheet(&deck, &self.config.settings, &store)?;
        if self.config.verbose {
            println!("Print sheet: {} page(s), {} image(s)", document.page_count(), document.image_count());
        }
        Self::save(document, &print_path)?;

        if !self.config.no_overview {
            let overview_path =
                proxy_printer::output_file_path(&self.config.output_dir, &self.config.deck_path, OVERVIEW_SUFFIX);
            let document = render::overview_sheet(&deck, &self.config.settings, &store)?;
            Self::save(document, &overview_path)?;
        }

        println!("{}", "My work is done.".green());
        Ok(())
    }

    /// Download images for all cards that do not have one yet.
    async fn fetch_images(&self, deck: &Deck, store: ImageStore) -> Result<()> {
        let client = ScryfallClient::new(&self.config.api_url)?;
        let lookup = CardLookup::new(client, self.config.delay, self.config.verbose);
        let fetcher = ImageFetcher::new(lookup, store);
        let report = fetcher.fetch_missing(deck).await?;

        if self.config.verbose || !report.downloaded.is_empty() {
            println!(
                "Downloaded {} image(s), {} already present",
                report.downloaded.len(),
                report.cached
            );
        }
        if !report.missing.is_empty() {
            print_warning!("No image for {} card(s): {}", report.missing.len(), report.missing.join(", "));
        }
        Ok(())
    }

    fn save(document: SheetDocument, path: &Path) -> Result<()> {
        document.save(path).with_context(|| {
            format!(
                "Save of {} failed. If you have the PDF file open, close it and try again.",
                path.display()
            )
        })?;
        println!("{} saved.", proxy_printer::path_to_string(path).cyan());
        Ok(())
    }
}
