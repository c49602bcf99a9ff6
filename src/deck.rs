//! Deck list parsing.
//!
//! A deck file has one entry per line in the form
//! `amount[x] [edition] name[ // name][ (edition) [collector number]]`.
//! Lines that do not start with an amount are ignored,
//! so headers like `Sideboard` and comment lines can stay in the file.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use itertools::Itertools;
use regex::Regex;

static RE_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)x?\s+(.+)$").expect("Failed to create regex pattern for amount"));

static RE_LEADING_EDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\[(]([A-Za-z0-9]{2,6})[\])]\s+(.+)$").expect("Failed to create regex pattern for leading edition")
});

static RE_TRAILING_EDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+\(([A-Za-z0-9]{2,6})\)(?:\s+(\S+))?$")
        .expect("Failed to create regex pattern for trailing edition")
});

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Largest accepted copy count for one deck line.
pub const MAX_AMOUNT: usize = 1000;

/// Separator between the faces of a double-faced card.
pub const FACE_SEPARATOR: &str = "//";

/// Which face of a double-faced card a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    #[default]
    Front,
    Back,
}

/// A specific printing requested for a card name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditionPin {
    /// Lowercase set code.
    pub set: String,
    /// Face of the card the pinned name refers to.
    pub face: Face,
}

/// One parsed line of a deck file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckLine {
    /// Number of copies.
    pub amount: usize,
    /// Card names: one, or two for a double-faced card (front, back).
    pub names: Vec<String>,
    /// Lowercase set code if the line pins an edition.
    pub edition: Option<String>,
    /// Collector number following a trailing edition.
    pub collector_number: Option<String>,
}

/// Fully expanded deck with one entry per physical copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<String>,
    pins: HashMap<String, EditionPin>,
}

/// Parse a single deck line.
///
/// Returns `None` for lines that do not start with an amount, have an amount over [`MAX_AMOUNT`],
/// or have no card name.
#[must_use]
pub fn parse_line(line: &str) -> Option<DeckLine> {
    let line = line.trim_start_matches(BYTE_ORDER_MARK).trim();
    let captures = RE_AMOUNT.captures(line)?;
    let amount: usize = captures[1].parse().ok().filter(|amount| *amount <= MAX_AMOUNT)?;
    let mut rest = captures[2].trim();

    let mut edition = None;
    let mut collector_number = None;

    if let Some(captures) = RE_LEADING_EDITION.captures(rest) {
        edition = Some(captures[1].to_lowercase());
        rest = captures.get(2).map_or("", |m| m.as_str().trim());
    }
    if let Some(captures) = RE_TRAILING_EDITION.captures(rest) {
        if edition.is_none() {
            edition = Some(captures[2].to_lowercase());
        }
        collector_number = captures.get(3).map(|m| m.as_str().to_string());
        rest = captures.get(1).map_or("", |m| m.as_str().trim());
    }

    let names: Vec<String> = rest
        .split(FACE_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect();

    if names.is_empty() {
        return None;
    }

    Some(DeckLine {
        amount,
        names,
        edition,
        collector_number,
    })
}

impl DeckLine {
    /// Copy of this line pinned to the given printing.
    #[must_use]
    pub fn pinned(&self, set: &str, collector_number: &str) -> Self {
        Self {
            edition: Some(set.to_lowercase()),
            collector_number: Some(collector_number.to_string()),
            ..self.clone()
        }
    }
}

/// Formats the line in the trailing edition form, for example `1 Swamp (M21) 250`.
impl fmt::Display for DeckLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = format!(" {FACE_SEPARATOR} ");
        write!(f, "{} {}", self.amount, self.names.join(separator.as_str()))?;
        if let Some(edition) = &self.edition {
            write!(f, " ({})", edition.to_uppercase())?;
            if let Some(number) = &self.collector_number {
                write!(f, " {number}")?;
            }
        }
        Ok(())
    }
}

impl Deck {
    /// Parse deck text. Malformed lines are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut deck = Self::default();
        for line in text.lines().filter_map(parse_line) {
            deck.push_line(line);
        }
        deck
    }

    /// Read and parse a deck file.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or is not valid UTF-8 text.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("Deck file does not exist: '{}'", path.display());
        }
        let text =
            fs::read_to_string(path).with_context(|| format!("Failed to read deck file: {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    fn push_line(&mut self, line: DeckLine) {
        let double_faced = line.names.len() > 1;
        for (index, name) in line.names.into_iter().enumerate() {
            if let Some(set) = &line.edition {
                let face = if double_faced && index > 0 { Face::Back } else { Face::Front };
                self.pins.entry(name.clone()).or_insert_with(|| EditionPin {
                    set: set.clone(),
                    face,
                });
            }
            self.cards.extend(std::iter::repeat_n(name, line.amount));
        }
    }

    /// All entries in file order, one per copy.
    #[must_use]
    pub fn cards(&self) -> &[String] {
        &self.cards
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Distinct card names in first-occurrence order.
    #[must_use]
    pub fn distinct(&self) -> Vec<&str> {
        self.cards.iter().map(String::as_str).unique().collect()
    }

    /// Number of copies of the given card.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.cards.iter().filter(|card| *card == name).count()
    }

    /// Distinct card names with copy counts, in first-occurrence order.
    #[must_use]
    pub fn counts(&self) -> Vec<(&str, usize)> {
        let counts = self.cards.iter().map(String::as_str).counts();
        self.distinct()
            .into_iter()
            .map(|name| (name, counts.get(name).copied().unwrap_or_default()))
            .collect()
    }

    /// Edition pin for the given card, if the deck requested one.
    #[must_use]
    pub fn pin(&self, name: &str) -> Option<&EditionPin> {
        self.pins.get(name)
    }

    /// Copy of the deck with only the cards matching the predicate.
    #[must_use]
    pub fn filtered(&self, keep: impl Fn(&str) -> bool) -> Self {
        let cards: Vec<String> = self.cards.iter().filter(|card| keep(card)).cloned().collect();
        let pins = self
            .pins
            .iter()
            .filter(|(name, _)| keep(name))
            .map(|(name, pin)| (name.clone(), pin.clone()))
            .collect();
        Self { cards, pins }
    }
}
