//! Page geometry for the print and overview sheets.
//!
//! Settings are in millimetres, all computed rectangles are in PDF points
//! with the origin at the bottom left corner of the page.

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use serde::Deserialize;

/// PDF points per millimetre.
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Cards per row and column on a print page.
pub const GRID_SIZE: usize = 3;

pub const CARDS_PER_PAGE: usize = GRID_SIZE * GRID_SIZE;

/// Standard trading card size.
pub const DEFAULT_CARD_WIDTH: f32 = 63.0;
pub const DEFAULT_CARD_HEIGHT: f32 = 88.0;

/// Largest font size for overview count labels.
const MAX_LABEL_FONT_SIZE: f32 = 12.0;

/// Named paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
    Legal,
}

impl PageSize {
    /// Width and height in millimetres.
    #[must_use]
    pub const fn dimensions(self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::A3 => (297.0, 420.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
        }
    }
}

/// RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const GRAY: Self = Self::new(200, 200, 200);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Colour components in the 0..=1 range used by PDF operators.
    #[must_use]
    pub fn components(self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|value| f32::from(value) / 255.0)
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    /// Parse `#rrggbb`, `rrggbb` or one of the names `black`, `white`, `gray`.
    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "black" => return Ok(Self::BLACK),
            "white" => return Ok(Self::WHITE),
            "gray" | "grey" => return Ok(Self::GRAY),
            _ => {}
        }

        let hex = value.trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid colour '{s}', expected a hex value like #1a1a1a");
        }
        let component = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|e| anyhow!("Invalid colour '{s}': {e}"))
        };
        Ok(Self::new(component(0..2)?, component(2..4)?, component(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Rectangle in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Card position on a print page.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement<'a> {
    pub card: &'a str,
    pub rect: Rect,
}

/// Overview tile for one distinct card.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<'a> {
    pub card: &'a str,
    pub count: usize,
    pub rect: Rect,
    /// White box behind the count text.
    pub label: Rect,
    /// Baseline start of the count text.
    pub text_x: f32,
    pub text_y: f32,
    pub font_size: f32,
}

impl Tile<'_> {
    /// Count label text, for example `4x`.
    #[must_use]
    pub fn label_text(&self) -> String {
        format!("{}x", self.count)
    }
}

/// Physical sheet settings.
///
/// Sizes are in millimetres.
/// Adjacent cards are `2 * spacing` apart and the card grid is centered on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetSettings {
    pub page_width: f32,
    pub page_height: f32,
    pub card_width: f32,
    pub card_height: f32,
    pub spacing_x: f32,
    pub spacing_y: f32,
    /// Page background colour.
    pub fill: Rgb,
}

impl Default for SheetSettings {
    fn default() -> Self {
        let (page_width, page_height) = PageSize::default().dimensions();
        Self {
            page_width,
            page_height,
            card_width: DEFAULT_CARD_WIDTH,
            card_height: DEFAULT_CARD_HEIGHT,
            spacing_x: 0.0,
            spacing_y: 0.0,
            fill: Rgb::BLACK,
        }
    }
}

/// Number of print pages needed for the given number of cards.
#[must_use]
pub const fn page_count(cards: usize) -> usize {
    cards.div_ceil(CARDS_PER_PAGE)
}

/// Side length of the square overview grid: `ceil(sqrt(count))`.
#[must_use]
pub fn overview_grid_size(count: usize) -> usize {
    let mut side = (count as f64).sqrt() as usize;
    while side * side < count {
        side += 1;
    }
    while side > 0 && (side - 1) * (side - 1) >= count {
        side -= 1;
    }
    side
}

impl SheetSettings {
    /// Check that sizes are positive and the card grid fits on the page.
    ///
    /// # Errors
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("page width", self.page_width),
            ("page height", self.page_height),
            ("card width", self.card_width),
            ("card height", self.card_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                bail!("Invalid {name}: {value} mm");
            }
        }
        for (name, value) in [("horizontal spacing", self.spacing_x), ("vertical spacing", self.spacing_y)] {
            if !value.is_finite() || value < 0.0 {
                bail!("Invalid {name}: {value} mm");
            }
        }
        let (grid_width, grid_height) = self.grid_size_mm();
        if grid_width > self.page_width || grid_height > self.page_height {
            bail!(
                "Card grid {grid_width:.1} x {grid_height:.1} mm does not fit on a {:.1} x {:.1} mm page",
                self.page_width,
                self.page_height
            );
        }
        Ok(())
    }

    /// Page size in points.
    #[must_use]
    pub fn page_size(&self) -> (f32, f32) {
        (self.page_width * POINTS_PER_MM, self.page_height * POINTS_PER_MM)
    }

    /// Total print grid size in millimetres.
    fn grid_size_mm(&self) -> (f32, f32) {
        let count = GRID_SIZE as f32;
        let gaps = 2.0 * (count - 1.0);
        (
            count * self.card_width + gaps * self.spacing_x,
            count * self.card_height + gaps * self.spacing_y,
        )
    }

    /// Left and bottom padding in points that centers the print grid.
    #[must_use]
    pub fn padding(&self) -> (f32, f32) {
        let (grid_width, grid_height) = self.grid_size_mm();
        (
            (self.page_width - grid_width) / 2.0 * POINTS_PER_MM,
            (self.page_height - grid_height) / 2.0 * POINTS_PER_MM,
        )
    }

    /// Rectangle for the given slot on a print page, filled row-major from the top left.
    #[must_use]
    pub fn card_rect(&self, slot: usize) -> Rect {
        let (padding_left, padding_bottom) = self.padding();
        let column = (slot % GRID_SIZE) as f32;
        let row_from_bottom = (GRID_SIZE - 1 - (slot / GRID_SIZE) % GRID_SIZE) as f32;
        let step_x = self.card_width + 2.0 * self.spacing_x;
        let step_y = self.card_height + 2.0 * self.spacing_y;
        Rect {
            x: padding_left + column * step_x * POINTS_PER_MM,
            y: padding_bottom + row_from_bottom * step_y * POINTS_PER_MM,
            width: self.card_width * POINTS_PER_MM,
            height: self.card_height * POINTS_PER_MM,
        }
    }

    /// Split the cards into print pages of up to nine placements each.
    #[must_use]
    pub fn print_pages<'a>(&self, cards: &'a [String]) -> Vec<Vec<Placement<'a>>> {
        cards
            .chunks(CARDS_PER_PAGE)
            .map(|page| {
                page.iter()
                    .enumerate()
                    .map(|(slot, card)| Placement {
                        card,
                        rect: self.card_rect(slot),
                    })
                    .collect()
            })
            .collect()
    }

    /// Overview tiles for the distinct cards with their copy counts.
    ///
    /// The tiles form a square grid covering the area of the 3x3 print grid
    /// without spacing, centered on the page.
    #[must_use]
    pub fn overview_tiles<'a>(&self, counts: &[(&'a str, usize)]) -> Vec<Tile<'a>> {
        let side = overview_grid_size(counts.len());
        if side == 0 {
            return Vec::new();
        }

        let scale = GRID_SIZE as f32 / side as f32;
        let tile_width = self.card_width * scale * POINTS_PER_MM;
        let tile_height = self.card_height * scale * POINTS_PER_MM;
        let left = (self.page_width - GRID_SIZE as f32 * self.card_width) / 2.0 * POINTS_PER_MM;
        let bottom = (self.page_height - GRID_SIZE as f32 * self.card_height) / 2.0 * POINTS_PER_MM;

        counts
            .iter()
            .enumerate()
            .map(|(index, &(card, count))| {
                let column = (index % side) as f32;
                let row_from_bottom = (side - 1 - index / side) as f32;
                let x = left + column * tile_width;
                let y = bottom + row_from_bottom * tile_height;
                let label = Rect {
                    x: x + tile_width / 10.0,
                    y: y + tile_height / 1.5,
                    width: tile_width / 4.0,
                    height: tile_height / 6.0,
                };
                Tile {
                    card,
                    count,
                    rect: Rect {
                        x,
                        y,
                        width: tile_width,
                        height: tile_height,
                    },
                    label,
                    text_x: label.x + tile_width / 20.0,
                    text_y: label.y + tile_height / 20.0,
                    font_size: (label.height * 0.6).min(MAX_LABEL_FONT_SIZE),
                }
            })
            .collect()
    }
}
