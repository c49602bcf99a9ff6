//! Configuration module for setcode.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use proxy_printer::fetch::DEFAULT_REQUEST_DELAY;
use proxy_printer::scryfall::DEFAULT_API_URL;

use crate::SetCodeArgs;

/// Name of the default output directory next to the deck file.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "set_added";

/// User configuration from the config file.
#[derive(Debug, Default, Deserialize)]
pub struct SetCodeConfig {
    #[serde(default)]
    pub decks_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Delay after each API request in milliseconds.
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub api_url: Option<String>,
    /// Overwrite an existing output file without asking.
    #[serde(default)]
    pub yes: bool,
    #[serde(default)]
    pub verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    setcode: SetCodeConfig,
}

impl SetCodeConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> Result<Self> {
        proxy_printer::config::read_user_config::<UserConfig>(proxy_printer::config::CONFIG_PATH.as_deref())
            .map(|config| config.setcode)
    }
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    /// Absolute path of the deck file.
    pub deck_path: PathBuf,
    /// File the pinned deck is written to.
    pub output_path: PathBuf,
    pub delay: Duration,
    pub api_url: String,
    pub yes: bool,
    pub verbose: bool,
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file is invalid or the deck file is not found.
    pub fn from_args(args: &SetCodeArgs) -> Result<Self> {
        Self::from_args_and_config(args, &SetCodeConfig::get_user_config()?)
    }

    /// Create config from given command line args and explicit user config.
    ///
    /// # Errors
    /// Returns an error if the deck file is not found.
    pub fn from_args_and_config(args: &SetCodeArgs, user_config: &SetCodeConfig) -> Result<Self> {
        let decks_dir = args
            .decks
            .clone()
            .or_else(|| user_config.decks_dir.clone())
            .unwrap_or_else(|| PathBuf::from(proxy_printer::DEFAULT_DECKS_DIR));

        let deck = args.deck.as_deref().context("Deck file argument is required")?;
        let deck_path = proxy_printer::resolve_deck_path(deck, &decks_dir)?;

        let output_dir = match args.output.clone().or_else(|| user_config.output_dir.clone()) {
            Some(dir) => dir,
            None => deck_path
                .parent()
                .context("Failed to get deck directory")?
                .join(DEFAULT_OUTPUT_DIR_NAME),
        };
        let file_name = deck_path.file_name().context("Failed to get deck file name")?;
        let output_path = output_dir.join(file_name);

        let delay = args
            .delay
            .or(user_config.delay_ms)
            .map_or(DEFAULT_REQUEST_DELAY, Duration::from_millis);

        let api_url = user_config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            deck_path,
            output_path,
            delay,
            api_url,
            yes: args.yes || user_config.yes,
            verbose: args.verbose || user_config.verbose,
        })
    }
}

#[cfg(test)]
mod test_set_code_config {
    use super::*;

    use std::fs;

    use clap::Parser;
    use tempfile::{TempDir, tempdir};

    fn deck_dir() -> (TempDir, PathBuf) {
        let dir = tempdir().expect("tempdir");
        let deck = dir.path().join("elves.txt");
        fs::write(&deck, "4 Llanowar Elves\n").expect("write deck");
        (dir, deck)
    }

    fn parse_args(args: &[&str]) -> SetCodeArgs {
        SetCodeArgs::try_parse_from(std::iter::once("setcode").chain(args.iter().copied())).expect("should parse args")
    }

    #[test]
    fn parses_config_section() {
        let toml = r#"
[setcode]
decks_dir = "lists"
output_dir = "pinned"
delay_ms = 50
api_url = "http://localhost:8080"
yes = true
verbose = true
"#;
        let config = toml::from_str::<UserConfig>(toml).expect("should parse").setcode;
        assert_eq!(config.decks_dir, Some(PathBuf::from("lists")));
        assert_eq!(config.output_dir, Some(PathBuf::from("pinned")));
        assert_eq!(config.delay_ms, Some(50));
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:8080"));
        assert!(config.yes);
        assert!(config.verbose);
    }

    #[test]
    fn default_output_is_next_to_deck() {
        let (_dir, deck) = deck_dir();
        let args = parse_args(&[deck.to_str().expect("utf8 path")]);
        let config = Config::from_args_and_config(&args, &SetCodeConfig::default()).expect("should create config");

        let deck_path = dunce::canonicalize(&deck).expect("canonicalize");
        let expected = deck_path
            .parent()
            .expect("parent")
            .join(DEFAULT_OUTPUT_DIR_NAME)
            .join("elves.txt");
        assert_eq!(config.output_path, expected);
        assert_eq!(config.delay, DEFAULT_REQUEST_DELAY);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.yes);
    }

    #[test]
    fn cli_output_overrides_config_output() {
        let (_dir, deck) = deck_dir();
        let args = parse_args(&[deck.to_str().expect("utf8 path"), "-o", "cli-out", "--delay", "0"]);
        let user_config = SetCodeConfig {
            output_dir: Some(PathBuf::from("config-out")),
            delay_ms: Some(300),
            ..Default::default()
        };
        let config = Config::from_args_and_config(&args, &user_config).expect("should create config");
        assert_eq!(config.output_path, PathBuf::from("cli-out").join("elves.txt"));
        assert_eq!(config.delay, Duration::ZERO);
    }

    #[test]
    fn config_output_used_when_cli_not_provided() {
        let (_dir, deck) = deck_dir();
        let args = parse_args(&[deck.to_str().expect("utf8 path")]);
        let user_config = SetCodeConfig {
            output_dir: Some(PathBuf::from("config-out")),
            yes: true,
            ..Default::default()
        };
        let config = Config::from_args_and_config(&args, &user_config).expect("should create config");
        assert_eq!(config.output_path, PathBuf::from("config-out").join("elves.txt"));
        assert!(config.yes);
    }

    #[test]
    fn missing_deck_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let decks = dir.path().to_str().expect("utf8 path");
        let args = parse_args(&["nothing.txt", "-d", decks]);
        assert!(Config::from_args_and_config(&args, &SetCodeConfig::default()).is_err());
    }
}
