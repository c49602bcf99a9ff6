//! Minimal PDF writer for card sheets.
//!
//! Supports exactly what the sheets need:
//! filled and stroked rectangles, JPEG images and single-line Helvetica text.
//! Each image file is embedded once per document and shared between pages.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::layout::{Rect, Rgb};

const PDF_VERSION: &str = "1.5";

/// Resource name of the text font.
const FONT_NAME: &[u8] = b"F1";

/// Quality used when other image formats are converted to JPEG.
const JPEG_QUALITY: u8 = 92;

/// Reference to an image embedded in a [`SheetDocument`].
#[derive(Debug, Clone)]
pub struct ImageRef {
    name: String,
    id: ObjectId,
}

/// Drawing operations for one page.
#[derive(Debug, Default)]
pub struct PageCanvas {
    operations: Vec<Operation>,
    images: Dictionary,
}

/// PDF document made of equally sized pages.
pub struct SheetDocument {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    images: HashMap<PathBuf, ImageRef>,
    width: f32,
    height: f32,
}

/// JPEG data ready for embedding.
struct JpegImage {
    width: u32,
    height: u32,
    grayscale: bool,
    data: Vec<u8>,
}

impl PageCanvas {
    /// Paint the whole page with the given colour.
    pub fn fill_page(&mut self, width: f32, height: f32, color: Rgb) {
        self.draw_box(
            Rect {
                x: 0.0,
                y: 0.0,
                width,
                height,
            },
            color,
            false,
        );
    }

    /// Draw a filled rectangle, optionally with a thin black outline.
    pub fn draw_box(&mut self, rect: Rect, fill: Rgb, stroke: bool) {
        let [r, g, b] = fill.components();
        self.operations.push(Operation::new("q", vec![]));
        self.operations
            .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        if stroke {
            self.operations
                .push(Operation::new("RG", vec![0.0_f32.into(), 0.0_f32.into(), 0.0_f32.into()]));
            self.operations.push(Operation::new("w", vec![0.5_f32.into()]));
        }
        self.operations.push(Operation::new(
            "re",
            vec![rect.x.into(), rect.y.into(), rect.width.into(), rect.height.into()],
        ));
        self.operations.push(Operation::new(if stroke { "B" } else { "f" }, vec![]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Draw an image scaled to fill the rectangle.
    pub fn draw_image(&mut self, image: &ImageRef, rect: Rect) {
        self.images.set(image.name.as_bytes().to_vec(), image.id);
        self.operations.push(Operation::new("q", vec![]));
        self.operations.push(Operation::new(
            "cm",
            vec![
                rect.width.into(),
                0.0_f32.into(),
                0.0_f32.into(),
                rect.height.into(),
                rect.x.into(),
                rect.y.into(),
            ],
        ));
        self.operations
            .push(Operation::new("Do", vec![Object::Name(image.name.as_bytes().to_vec())]));
        self.operations.push(Operation::new("Q", vec![]));
    }

    /// Draw a single line of text with its baseline starting at `(x, y)`.
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgb) {
        let [r, g, b] = color.components();
        self.operations.push(Operation::new("BT", vec![]));
        self.operations
            .push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        self.operations
            .push(Operation::new("Tf", vec![Object::Name(FONT_NAME.to_vec()), size.into()]));
        self.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.operations
            .push(Operation::new("Tj", vec![Object::string_literal(encode_text(text))]));
        self.operations.push(Operation::new("ET", vec![]));
    }
}

impl SheetDocument {
    /// Create an empty document with the given page size in points.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
            images: HashMap::new(),
            width,
            height,
        }
    }

    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Number of distinct images embedded so far.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Embed an image file, reusing the existing object if the file was already added.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn image(&mut self, path: &Path) -> Result<ImageRef> {
        if let Some(image) = self.images.get(path) {
            return Ok(image.clone());
        }

        let jpeg = load_jpeg(path).with_context(|| format!("Failed to load image: {}", path.display()))?;
        let color_space = if jpeg.grayscale { "DeviceGray" } else { "DeviceRGB" };
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(jpeg.width),
                "Height" => i64::from(jpeg.height),
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.data,
        )
        .with_compression(false);

        let id = self.doc.add_object(stream);
        let image = ImageRef {
            name: format!("Im{}", self.images.len() + 1),
            id,
        };
        self.images.insert(path.to_path_buf(), image.clone());
        Ok(image)
    }

    /// Add a finished page to the document.
    ///
    /// # Errors
    /// Returns an error if the page content cannot be encoded.
    pub fn add_page(&mut self, canvas: PageCanvas) -> Result<()> {
        let content = Content {
            operations: canvas.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode().context("Failed to encode page content")?));

        let resources = dictionary! {
            "Font" => dictionary! { "F1" => self.font_id },
            "XObject" => canvas.images,
        };

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![0.0_f32.into(), 0.0_f32.into(), self.width.into(), self.height.into()],
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Write the document to the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(mut self, path: &Path) -> Result<()> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        self.doc
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Read an image file as JPEG data.
///
/// RGB and grayscale JPEG files are embedded as they are,
/// anything else is decoded and re-encoded.
fn load_jpeg(path: &Path) -> Result<JpegImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    let color = decoder.color_type();

    if format == Some(ImageFormat::Jpeg) && matches!(color, ColorType::Rgb8 | ColorType::L8) {
        return Ok(JpegImage {
            width,
            height,
            grayscale: color == ColorType::L8,
            data: fs::read(path)?,
        });
    }

    let rgb = image::open(path)?.to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(JpegImage {
        width: rgb.width(),
        height: rgb.height(),
        grayscale: false,
        data,
    })
}

/// Encode text for the standard Helvetica font.
///
/// Characters outside Latin-1 are replaced with `?`.
fn encode_text(text: &str) -> Vec<u8> {
    text.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')).collect()
}

#[cfg(test)]
mod test_sheet_document {
    use super::*;

    use image::{Rgb as Pixel, RgbImage};
    use tempfile::tempdir;

    fn write_jpeg(path: &Path) {
        let image = RgbImage::from_pixel(20, 28, Pixel([200, 30, 30]));
        image.save(path).expect("should write jpeg");
    }

    fn rect() -> Rect {
        Rect {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 140.0,
        }
    }

    #[test]
    fn encode_text_replaces_unsupported_characters() {
        assert_eq!(encode_text("4x"), b"4x".to_vec());
        assert_eq!(encode_text("Æther"), vec![0xC6, b't', b'h', b'e', b'r']);
        assert_eq!(encode_text("火"), b"?".to_vec());
    }

    #[test]
    fn embeds_each_image_once() {
        let dir = tempdir().expect("tempdir");
        let image_path = dir.path().join("Swamp.jpg");
        write_jpeg(&image_path);

        let mut document = SheetDocument::new(595.0, 842.0);
        for _ in 0..2 {
            let image = document.image(&image_path).expect("should embed");
            let mut canvas = PageCanvas::default();
            canvas.draw_image(&image, rect());
            canvas.draw_image(&image, rect());
            document.add_page(canvas).expect("should add page");
        }

        assert_eq!(document.image_count(), 1);
        assert_eq!(document.page_count(), 2);
    }

    #[test]
    fn converts_png_to_jpeg() {
        let dir = tempdir().expect("tempdir");
        let image_path = dir.path().join("Island.jpg");
        let image = RgbImage::from_pixel(8, 8, Pixel([0, 0, 255]));
        image
            .save_with_format(&image_path, ImageFormat::Png)
            .expect("should write png");

        let jpeg = load_jpeg(&image_path).expect("should convert");
        assert_eq!((jpeg.width, jpeg.height), (8, 8));
        assert_eq!(&jpeg.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn saved_document_can_be_loaded() {
        let dir = tempdir().expect("tempdir");
        let image_path = dir.path().join("Forest.jpg");
        write_jpeg(&image_path);

        let mut document = SheetDocument::new(595.0, 842.0);
        let image = document.image(&image_path).expect("should embed");
        let mut canvas = PageCanvas::default();
        canvas.fill_page(595.0, 842.0, Rgb::BLACK);
        canvas.draw_image(&image, rect());
        canvas.draw_box(rect(), Rgb::WHITE, true);
        canvas.draw_text("3x", 20.0, 20.0, 12.0, Rgb::BLACK);
        document.add_page(canvas).expect("should add page");

        let output = dir.path().join("out.pdf");
        document.save(&output).expect("should save");

        let loaded = Document::load(&output).expect("should load pdf");
        assert_eq!(loaded.get_pages().len(), 1);
    }

    #[test]
    fn missing_image_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let mut document = SheetDocument::new(595.0, 842.0);
        assert!(document.image(&dir.path().join("missing.jpg")).is_err());
    }

    #[test]
    fn save_to_missing_directory_fails() {
        let dir = tempdir().expect("tempdir");
        let document = SheetDocument::new(595.0, 842.0);
        let result = document.save(&dir.path().join("no/such/dir/out.pdf"));
        assert!(result.is_err());
    }
}
