use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use proxy_printer::deck::{self, Deck};
use proxy_printer::fetch::{CardLookup, Printing};
use proxy_printer::print_warning;
use proxy_printer::scryfall::{CardSource, ScryfallClient};

use crate::SetCodeArgs;
use crate::config::Config;

/// Writes a copy of a deck with every card pinned to a printing.
pub struct SetCode {
    config: Config,
}

/// Deck lines after pinning.
#[derive(Debug, Default)]
pub struct PinnedDeck {
    /// Output lines in input order.
    pub lines: Vec<String>,
    /// Number of lines that got an edition added.
    pub pinned: usize,
    /// Cards without a matching printing, in first-occurrence order.
    pub missing: Vec<String>,
}

impl SetCode {
    /// Create a new set code writer from command line arguments.
    pub fn new(args: &SetCodeArgs) -> Result<Self> {
        Ok(Self {
            config: Config::from_args(args)?,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let text = fs::read_to_string(&self.config.deck_path)
            .with_context(|| format!("Failed to read deck file: {}", self.config.deck_path.display()))?;

        if Deck::parse(&text).is_empty() {
            bail!("No cards found in deck: {}", self.config.deck_path.display());
        }

        if self.config.output_path.exists() && !self.confirm_overwrite()? {
            println!("Exiting without changes");
            return Ok(());
        }

        let client = ScryfallClient::new(&self.config.api_url)?;
        let lookup = CardLookup::new(client, self.config.delay, self.config.verbose);
        let result = pin_editions(&text, &lookup).await;

        if let Some(parent) = self.config.output_path.parent() {
            proxy_printer::ensure_dir(parent)?;
        }
        let mut content = result.lines.join("\n");
        content.push('\n');
        fs::write(&self.config.output_path, content)
            .with_context(|| format!("Failed to write file: {}", self.config.output_path.display()))?;

        println!("Pinned {} line(s)", result.pinned);
        if !result.missing.is_empty() {
            print_warning!("No printing found for: {}", result.missing.join(", "));
        }
        println!("{} saved.", proxy_printer::path_to_string(&self.config.output_path).cyan());
        println!("{}", "My work is done.".green());
        Ok(())
    }

    /// Ask before overwriting an existing output file.
    fn confirm_overwrite(&self) -> Result<bool> {
        if self.config.yes {
            return Ok(true);
        }

        print!(
            "{} [{}] ",
            format!("File '{}' already exists. Overwrite?", self.config.output_path.display()).yellow(),
            "Y/n".dimmed()
        );
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        io::stdin().read_line(&mut input).context("Failed to read input")?;
        Ok(is_confirmation(&input))
    }
}

/// Check if the user answer accepts the default action.
fn is_confirmation(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

/// Add the preferred printing to every deck line that does not have an edition yet.
///
/// Double-faced cards are resolved by the front face.
/// Other lines and cards without a printing are copied unchanged.
pub async fn pin_editions<S: CardSource>(text: &str, lookup: &CardLookup<S>) -> PinnedDeck {
    let mut result = PinnedDeck::default();
    let mut printings: HashMap<String, Option<Printing>> = HashMap::new();

    for raw_line in text.lines() {
        let Some(line) = deck::parse_line(raw_line).filter(|line| line.edition.is_none()) else {
            result.lines.push(raw_line.trim_end().to_string());
            continue;
        };

        let name = line.names[0].clone();
        if !printings.contains_key(&name) {
            let printing = lookup.resolve_printing(&name).await;
            match &printing {
                Some(printing) => println!("{} found in {} frame", name.green(), printing.label.cyan()),
                None => {
                    print_warning!("Card '{name}' not found with any of the search filters");
                    result.missing.push(name.clone());
                }
            }
            printings.insert(name.clone(), printing);
        }

        match printings.get(&name).and_then(Option::as_ref) {
            Some(printing) => {
                result
                    .lines
                    .push(line.pinned(&printing.set, &printing.collector_number).to_string());
                result.pinned += 1;
            }
            None => result.lines.push(raw_line.trim_end().to_string()),
        }
    }

    result
}

#[cfg(test)]
mod test_pin_editions {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use proxy_printer::deck::Face;
    use proxy_printer::fetch::{FRAME_FILTERS, exact_query};
    use proxy_printer::scryfall::Card;

    /// Card source knowing a fixed set of cards, all found with the second filter.
    struct FakeSource {
        known: Vec<(&'static str, &'static str, &'static str)>,
        searches: Rc<Cell<usize>>,
    }

    impl FakeSource {
        fn new(known: Vec<(&'static str, &'static str, &'static str)>) -> Self {
            Self {
                known,
                searches: Rc::default(),
            }
        }
    }

    impl CardSource for FakeSource {
        async fn search(&self, query: &str) -> Result<Vec<Card>> {
            self.searches.set(self.searches.get() + 1);
            let cards = self
                .known
                .iter()
                .filter(|(name, ..)| query == exact_query(name) || query == FRAME_FILTERS[1].query(name))
                .map(|(name, set, number)| Card {
                    name: (*name).to_string(),
                    set: (*set).to_string(),
                    collector_number: (*number).to_string(),
                    image_uris: None,
                    card_faces: Vec::new(),
                })
                .collect();
            Ok(cards)
        }

        async fn named_image(&self, _name: &str, _set: &str, _face: Face) -> Result<Vec<u8>> {
            bail!("not used")
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>> {
            bail!("not used")
        }
    }

    fn lookup(known: Vec<(&'static str, &'static str, &'static str)>) -> CardLookup<FakeSource> {
        CardLookup::new(FakeSource::new(known), Duration::ZERO, false)
    }

    /// Lookup together with a shared counter of search requests.
    fn counted_lookup(
        known: Vec<(&'static str, &'static str, &'static str)>,
    ) -> (CardLookup<FakeSource>, Rc<Cell<usize>>) {
        let source = FakeSource::new(known);
        let searches = Rc::clone(&source.searches);
        (CardLookup::new(source, Duration::ZERO, false), searches)
    }

    #[tokio::test]
    async fn adds_edition_to_plain_lines() {
        let lookup = lookup(vec![("Goblin Guide", "zen", "126"), ("Mountain", "lea", "290")]);
        let result = pin_editions("4 Goblin Guide\n16 Mountain\n", &lookup).await;

        assert_eq!(result.lines, vec!["4 Goblin Guide (ZEN) 126", "16 Mountain (LEA) 290"]);
        assert_eq!(result.pinned, 2);
        assert!(result.missing.is_empty());
    }

    #[tokio::test]
    async fn output_parses_to_same_deck() {
        let lookup = lookup(vec![("Fire", "apc", "128"), ("Shock", "sth", "94")]);
        let text = "Main\n2 Fire // Ice\n3x Shock\n";
        let result = pin_editions(text, &lookup).await;
        let pinned = result.lines.join("\n");

        assert_eq!(Deck::parse(&pinned).cards(), Deck::parse(text).cards());
        let deck = Deck::parse(&pinned);
        assert_eq!(deck.pin("Fire").map(|pin| pin.set.as_str()), Some("apc"));
        assert_eq!(deck.pin("Ice").map(|pin| pin.face), Some(Face::Back));
    }

    #[tokio::test]
    async fn keeps_other_lines_unchanged() {
        let lookup = lookup(vec![("Island", "lea", "288")]);
        let text = "// Sideboard\n\n1 Swamp (M21) 250\n2 [ICE] Island\n1 Island";
        let result = pin_editions(text, &lookup).await;

        assert_eq!(
            result.lines,
            vec!["// Sideboard", "", "1 Swamp (M21) 250", "2 [ICE] Island", "1 Island (LEA) 288"]
        );
        assert_eq!(result.pinned, 1);
    }

    #[tokio::test]
    async fn unknown_card_is_copied_and_reported() {
        let lookup = lookup(Vec::new());
        let result = pin_editions("1 Lightnig Bolt\n2 Lightnig Bolt\n", &lookup).await;

        assert_eq!(result.lines, vec!["1 Lightnig Bolt", "2 Lightnig Bolt"]);
        assert_eq!(result.missing, vec!["Lightnig Bolt".to_string()]);
        assert_eq!(result.pinned, 0);
    }

    #[tokio::test]
    async fn each_name_is_looked_up_once() {
        let (lookup, searches) = counted_lookup(vec![("Forest", "lea", "295")]);
        let result = pin_editions("4 Forest\n4 Forest\n", &lookup).await;

        assert_eq!(result.pinned, 2);
        // One spelling check and two filter searches.
        assert_eq!(searches.get(), 3);
    }

    #[test]
    fn confirmation_answers() {
        assert!(is_confirmation("\n"));
        assert!(is_confirmation("y\n"));
        assert!(is_confirmation("YES"));
        assert!(!is_confirmation("n\n"));
        assert!(!is_confirmation("no"));
    }
}
