//! Print and overview sheet rendering.

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::deck::Deck;
use crate::fetch::ImageStore;
use crate::layout::{Rect, Rgb, SheetSettings};
use crate::pdf::{PageCanvas, SheetDocument};

/// Font size of the card name on placeholder boxes.
const PLACEHOLDER_FONT_SIZE: f32 = 7.0;

/// What to do with cards that have no local image at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingImage {
    /// Draw a grey box with the card name.
    #[default]
    Placeholder,
    /// Leave the card out of both sheets.
    Skip,
    /// Abort without writing any sheet.
    Fail,
}

/// Card names in the deck without a local image, in first-occurrence order.
#[must_use]
pub fn missing_images<'a>(deck: &'a Deck, store: &ImageStore) -> Vec<&'a str> {
    deck.distinct()
        .into_iter()
        .filter(|name| !store.contains(name))
        .collect()
}

/// Apply the missing image policy and return the deck to render.
///
/// # Errors
/// Returns an error for [`MissingImage::Fail`] when any image is missing.
pub fn apply_missing_policy(deck: &Deck, store: &ImageStore, policy: MissingImage) -> Result<Deck> {
    let missing = missing_images(deck, store);
    if missing.is_empty() {
        return Ok(deck.clone());
    }
    match policy {
        MissingImage::Placeholder => Ok(deck.clone()),
        MissingImage::Skip => Ok(deck.filtered(|name| store.contains(name))),
        MissingImage::Fail => bail!("Missing images for {} card(s): {}", missing.len(), missing.join(", ")),
    }
}

/// Render the print sheet: nine cards per page at full card size.
///
/// # Errors
/// Returns an error if an existing image file cannot be embedded.
pub fn print_sheet(deck: &Deck, settings: &SheetSettings, store: &ImageStore) -> Result<SheetDocument> {
    let (width, height) = settings.page_size();
    let mut document = SheetDocument::new(width, height);

    for page in settings.print_pages(deck.cards()) {
        let mut canvas = PageCanvas::default();
        canvas.fill_page(width, height, settings.fill);
        for placement in page {
            draw_card(&mut document, &mut canvas, store, placement.card, placement.rect)?;
        }
        document.add_page(canvas)?;
    }

    Ok(document)
}

/// Render the overview sheet: one tile per distinct card with its copy count.
///
/// # Errors
/// Returns an error if an existing image file cannot be embedded.
pub fn overview_sheet(deck: &Deck, settings: &SheetSettings, store: &ImageStore) -> Result<SheetDocument> {
    let (width, height) = settings.page_size();
    let mut document = SheetDocument::new(width, height);
    let counts = deck.counts();

    let mut canvas = PageCanvas::default();
    for tile in settings.overview_tiles(&counts) {
        draw_card(&mut document, &mut canvas, store, tile.card, tile.rect)?;
        canvas.draw_box(tile.label, Rgb::WHITE, true);
        canvas.draw_text(&tile.label_text(), tile.text_x, tile.text_y, tile.font_size, Rgb::BLACK);
    }
    document.add_page(canvas)?;

    Ok(document)
}

fn draw_card(
    document: &mut SheetDocument,
    canvas: &mut PageCanvas,
    store: &ImageStore,
    card: &str,
    rect: Rect,
) -> Result<()> {
    let path = store.path_for(card);
    if path.is_file() {
        let image = document.image(&path)?;
        canvas.draw_image(&image, rect);
    } else {
        canvas.draw_box(rect, Rgb::GRAY, true);
        let font_size = PLACEHOLDER_FONT_SIZE.min(rect.height / 10.0);
        canvas.draw_text(
            card,
            rect.x + rect.width / 12.0,
            rect.y + rect.height - 2.0 * font_size,
            font_size,
            Rgb::BLACK,
        );
    }
    Ok(())
}
