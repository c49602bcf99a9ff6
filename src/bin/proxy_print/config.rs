//! Configuration module for proxyprint.
//!
//! Handles reading configuration from CLI arguments and the user config file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use proxy_printer::fetch::DEFAULT_REQUEST_DELAY;
use proxy_printer::layout::{PageSize, Rgb, SheetSettings};
use proxy_printer::render::MissingImage;
use proxy_printer::scryfall::DEFAULT_API_URL;

use crate::ProxyPrintArgs;

/// User configuration from the config file.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyPrintConfig {
    #[serde(default)]
    pub images_dir: Option<PathBuf>,
    #[serde(default)]
    pub decks_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Named paper size.
    #[serde(default)]
    pub page_size: Option<PageSize>,
    /// Custom page width in millimetres, overrides the named size.
    #[serde(default)]
    pub page_width: Option<f32>,
    /// Custom page height in millimetres, overrides the named size.
    #[serde(default)]
    pub page_height: Option<f32>,
    #[serde(default)]
    pub card_width: Option<f32>,
    #[serde(default)]
    pub card_height: Option<f32>,
    #[serde(default)]
    pub spacing_x: Option<f32>,
    #[serde(default)]
    pub spacing_y: Option<f32>,
    /// Page background colour.
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub missing: Option<MissingImage>,
    /// Delay after each API request in milliseconds.
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub no_overview: bool,
    #[serde(default)]
    pub verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    proxyprint: ProxyPrintConfig,
}

impl ProxyPrintConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> Result<Self> {
        proxy_printer::config::read_user_config::<UserConfig>(proxy_printer::config::CONFIG_PATH.as_deref())
            .map(|config| config.proxyprint)
    }
}

/// Final config combined from CLI arguments and user config file.
#[derive(Debug)]
pub struct Config {
    /// Absolute path of the deck file.
    pub deck_path: PathBuf,
    pub images_dir: PathBuf,
    pub output_dir: PathBuf,
    pub settings: SheetSettings,
    pub missing: MissingImage,
    pub delay: Duration,
    pub api_url: String,
    pub offline: bool,
    pub no_overview: bool,
    pub verbose: bool,
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file is invalid, the deck file is not found,
    /// or the sheet settings are invalid.
    pub fn from_args(args: &ProxyPrintArgs) -> Result<Self> {
        Self::from_args_and_config(args, &ProxyPrintConfig::get_user_config()?)
    }

    /// Create config from given command line args and explicit user config.
    ///
    /// # Errors
    /// Returns an error if the deck file is not found or the sheet settings are invalid.
    pub fn from_args_and_config(args: &ProxyPrintArgs, user_config: &ProxyPrintConfig) -> Result<Self> {
        let decks_dir = args
            .decks
            .clone()
            .or_else(|| user_config.decks_dir.clone())
            .unwrap_or_else(|| PathBuf::from(proxy_printer::DEFAULT_DECKS_DIR));

        let deck = args.deck.as_deref().context("Deck file argument is required")?;
        let deck_path = proxy_printer::resolve_deck_path(deck, &decks_dir)?;

        let images_dir = args
            .images
            .clone()
            .or_else(|| user_config.images_dir.clone())
            .unwrap_or_else(|| PathBuf::from(proxy_printer::DEFAULT_IMAGES_DIR));

        let output_dir = args
            .output
            .clone()
            .or_else(|| user_config.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(proxy_printer::DEFAULT_OUTPUT_DIR));

        let settings = Self::sheet_settings(args, user_config)?;

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
            images_dir,
            output_dir,
            settings,
            missing: args.missing.or(user_config.missing).unwrap_or_default(),
            delay,
            api_url,
            offline: args.offline || user_config.offline,
            no_overview: args.no_overview || user_config.no_overview,
            verbose: args.verbose || user_config.verbose,
        })
    }

    /// Combine sheet settings and check that they are usable.
    ///
    /// A page size given on the command line wins over a custom page size in the config file.
    fn sheet_settings(args: &ProxyPrintArgs, user_config: &ProxyPrintConfig) -> Result<SheetSettings> {
        let defaults = SheetSettings::default();

        let (page_width, page_height) = args.page_size.map_or_else(
            || {
                let (width, height) = user_config.page_size.unwrap_or_default().dimensions();
                (
                    user_config.page_width.unwrap_or(width),
                    user_config.page_height.unwrap_or(height),
                )
            },
            PageSize::dimensions,
        );

        let fill = match args.fill.as_deref().or(user_config.fill.as_deref()) {
            Some(value) => value.parse::<Rgb>()?,
            None => defaults.fill,
        };

        let settings = SheetSettings {
            page_width,
            page_height,
            card_width: args.card_width.or(user_config.card_width).unwrap_or(defaults.card_width),
            card_height: args
                .card_height
                .or(user_config.card_height)
                .unwrap_or(defaults.card_height),
            spacing_x: args.spacing_x.or(user_config.spacing_x).unwrap_or(defaults.spacing_x),
            spacing_y: args.spacing_y.or(user_config.spacing_y).unwrap_or(defaults.spacing_y),
            fill,
        };
        settings.validate()?;
        Ok(settings)
    }
}
