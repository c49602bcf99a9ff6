//! Card image lookup and local image storage.
//!
//! Images are looked up with an ordered list of search filters,
//! from the most preferred frame style to whatever printing is available.
//! The first filter returning a card with a usable image wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use unicode_normalization::UnicodeNormalization;

use crate::deck::{Deck, EditionPin, Face};
use crate::scryfall::{Card, CardSource};

/// Delay after each API request to stay within the Scryfall rate limits.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Card image file extension.
const IMAGE_EXTENSION: &str = "jpg";

/// Characters that are not allowed in file names on all platforms.
const INVALID_FILE_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// A named search refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFilter {
    /// Human-readable name shown when a card is found with this filter.
    pub label: &'static str,
    /// Scryfall search syntax appended to the exact name query.
    pub predicate: &'static str,
}

/// Search filters in order of preference.
pub const FRAME_FILTERS: [SearchFilter; 5] = [
    SearchFilter {
        label: "93/97",
        predicate: "(frame:1993 or frame:1997) prefer:oldest (not:promo or s:phpr) unique:cards not:judge_gift not:boosterfun -set:sld lang:en",
    },
    SearchFilter {
        label: "Retro",
        predicate: "frame:1997 prefer:oldest unique:cards (is:boosterfun or is:judge_gift or is:promo or set:sld) -a:malone lang:en",
    },
    SearchFilter {
        label: "03/Future",
        predicate: "(frame:2003 or frame:future) prefer:oldest not:promo unique:cards not:judge_gift not:boosterfun lang:en",
    },
    SearchFilter {
        label: "Extended",
        predicate: "prefer:oldest unique:cards is:extended lang:en",
    },
    SearchFilter {
        label: "Any",
        predicate: "prefer:oldest unique:cards not:promo not:boosterfun not:showcase not:etched -frame:inverted lang:en",
    },
];

impl SearchFilter {
    /// Full search query for the given card name.
    #[must_use]
    pub fn query(&self, name: &str) -> String {
        format!("{} {}", exact_query(name), self.predicate)
    }
}

/// Query matching any paper printing of the exact card name.
#[must_use]
pub fn exact_query(name: &str) -> String {
    format!("!\"{name}\" game:paper")
}

/// Convert a card name to a file name stem.
///
/// Apostrophes are removed and characters invalid in file names are replaced with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.nfc()
        .filter(|c| *c != '\'')
        .map(|c| if INVALID_FILE_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Directory of downloaded card images, one file per card name.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the image directory if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("Failed to create image directory: {}", self.dir.display()))?;
        }
        Ok(())
    }

    /// Local image path for the given card name.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{IMAGE_EXTENSION}", sanitize_file_name(name)))
    }

    /// Check if an image for the card already exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Write image data for the card.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(name);
        fs::write(&path, bytes).with_context(|| format!("Failed to write image: {}", path.display()))?;
        Ok(path)
    }
}

/// Printing of a card selected by the search filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printing {
    /// Lowercase set code.
    pub set: String,
    pub collector_number: String,
    /// Label of the filter that matched.
    pub label: &'static str,
    /// Border-crop image URL for the requested name.
    pub image_url: Option<String>,
}

/// Result of fetching the images of a deck.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Downloaded cards with the filter label or edition they were found with.
    pub downloaded: Vec<(String, String)>,
    /// Number of cards that already had a local image.
    pub cached: usize,
    /// Cards that could not be found.
    pub missing: Vec<String>,
}

/// Card lookups against a [`CardSource`] with a pause after every request.
pub struct CardLookup<S: CardSource> {
    source: S,
    delay: Duration,
    verbose: bool,
}

impl<S: CardSource> CardLookup<S> {
    #[must_use]
    pub const fn new(source: S, delay: Duration, verbose: bool) -> Self {
        Self { source, delay, verbose }
    }

    /// Select the preferred printing for a card without downloading anything.
    ///
    /// Returns `None` if the card does not exist in paper or no filter matches.
    pub async fn resolve_printing(&self, name: &str) -> Option<Printing> {
        if !self.exists(name).await {
            return None;
        }
        for filter in &FRAME_FILTERS {
            if let Some(printing) = self.search_filter(name, filter).await {
                return Some(printing);
            }
        }
        None
    }

    /// Check that the exact card name exists in paper.
    async fn exists(&self, name: &str) -> bool {
        let result = self.source.search(&exact_query(name)).await;
        self.pause().await;
        match result {
            Ok(cards) => !cards.is_empty(),
            Err(error) => {
                if self.verbose {
                    crate::print_warning!("Search for {name} failed: {error}");
                }
                false
            }
        }
    }

    /// Run one filter search and pick the first returned card.
    ///
    /// Failed requests count as no match.
    async fn search_filter(&self, name: &str, filter: &SearchFilter) -> Option<Printing> {
        let query = filter.query(name);
        if self.verbose {
            println!("{}", format!("Searching: {query}").dimmed());
        }

        let result = self.source.search(&query).await;
        self.pause().await;

        let cards = match result {
            Ok(cards) => cards,
            Err(error) => {
                if self.verbose {
                    crate::print_warning!("{} search for {name} failed: {error}", filter.label);
                }
                return None;
            }
        };

        cards.first().map(|card: &Card| Printing {
            set: card.set.clone(),
            collector_number: card.collector_number.clone(),
            label: filter.label,
            image_url: card.border_crop_url(name).map(ToString::to_string),
        })
    }

    /// Fetch the image of a pinned card.
    ///
    /// Split cards have no back face, so a failed back face request is retried as a front face.
    async fn named_image(&self, name: &str, pin: &EditionPin) -> Result<Vec<u8>> {
        let result = self.source.named_image(name, &pin.set, pin.face).await;
        self.pause().await;
        if result.is_ok() || pin.face == Face::Front {
            return result;
        }

        if self.verbose {
            println!("{name} has no back face in set {}, trying the front face", pin.set.to_uppercase());
        }
        let result = self.source.named_image(name, &pin.set, Face::Front).await;
        self.pause().await;
        result
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let result = self.source.download(url).await;
        self.pause().await;
        result
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Downloads missing card images into an [`ImageStore`].
pub struct ImageFetcher<S: CardSource> {
    lookup: CardLookup<S>,
    store: ImageStore,
}

impl<S: CardSource> ImageFetcher<S> {
    #[must_use]
    pub const fn new(lookup: CardLookup<S>, store: ImageStore) -> Self {
        Self { lookup, store }
    }

    #[must_use]
    pub const fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Download images for all distinct deck cards that do not have a local image yet.
    ///
    /// Cards that cannot be found are reported and skipped.
    ///
    /// # Errors
    /// Returns an error if the image directory cannot be created.
    pub async fn fetch_missing(&self, deck: &Deck) -> Result<FetchReport> {
        self.store.ensure_dir()?;

        let mut report = FetchReport::default();
        for name in deck.distinct() {
            if self.store.contains(name) {
                if self.lookup.verbose {
                    println!("Using existing image for {name}");
                }
                report.cached += 1;
                continue;
            }

            match self.fetch_card(name, deck.pin(name)).await {
                Ok(Some(source)) => {
                    println!("{} found in {}", name.green(), source.cyan());
                    report.downloaded.push((name.to_string(), source));
                }
                Ok(None) => {
                    crate::print_warning!("Can not find {name} on Scryfall. Check the spelling and DFC formatting.");
                    report.missing.push(name.to_string());
                }
                Err(error) => {
                    crate::print_error!("Failed to get image for {name}: {error}");
                    report.missing.push(name.to_string());
                }
            }
        }

        Ok(report)
    }

    /// Find and store the image for a single card.
    ///
    /// Returns a description of where the image was found,
    /// or `None` if no lookup succeeded.
    async fn fetch_card(&self, name: &str, pin: Option<&EditionPin>) -> Result<Option<String>> {
        if let Some(pin) = pin {
            match self.lookup.named_image(name, pin).await {
                Ok(bytes) => {
                    self.store.save(name, &bytes)?;
                    return Ok(Some(format!("set {}", pin.set.to_uppercase())));
                }
                Err(error) => {
                    crate::print_warning!("{name} not found in set {}: {error}", pin.set.to_uppercase());
                }
            }
        }

        if !self.lookup.exists(name).await {
            return Ok(None);
        }

        for filter in &FRAME_FILTERS {
            let Some(printing) = self.lookup.search_filter(name, filter).await else {
                continue;
            };
            let Some(url) = printing.image_url else {
                continue;
            };

            match self.lookup.download(&url).await {
                Ok(bytes) => {
                    self.store.save(name, &bytes)?;
                    if self.lookup.verbose {
                        println!("Downloaded {url}");
                    }
                    return Ok(Some(format!("{} frame", filter.label)));
                }
                Err(error) => {
                    crate::print_warning!("Error getting image for {name}: {error}");
                }
            }
        }

        Ok(None)
    }
}
