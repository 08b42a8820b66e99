//! Drawing surface.
//!
//! [`Canvas`] is the only thing the layout engine draws through: text at an
//! anchored x, horizontal rules, bordered grid cells, rasters and page breaks.
//! [`PdfCanvas`] implements it on top of printpdf; coordinates are points
//! with the origin at the bottom-left of the page.

use image::GrayImage;
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Px,
    Rgb,
};
use std::io::{BufWriter, Cursor};

use crate::config::Geometry;
use crate::error::RenderError;
use crate::font_metrics::{get_metrics, text_width};

// ============================================================================
// CONSTANTS
// ============================================================================

const PT_TO_MM: f32 = 0.352_777_78;
const LAYER_NAME: &str = "Layer 1";

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

/// Horizontal anchor of a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Text starts at x
    Left(f32),
    /// Text is centered on x
    Center(f32),
    /// Text ends at x
    Right(f32),
}

impl Anchor {
    /// Start x of `width` points of text.
    pub fn start(&self, width: f32) -> f32 {
        match *self {
            Anchor::Left(x) => x,
            Anchor::Center(x) => x - width / 2.0,
            Anchor::Right(x) => x - width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub bold: bool,
    /// Size in points
    pub size: f32,
}

impl FontSpec {
    pub fn new(size: f32, bold: bool) -> Self {
        FontSpec { bold, size }
    }

    pub fn width(&self, text: &str) -> f32 {
        text_width(text, self.bold, self.size)
    }
}

/// Axis-aligned box; `y` is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Absolute-position drawing surface with no knowledge of receipts.
pub trait Canvas {
    /// Draw one line of text with its baseline at `y`.
    fn text(&mut self, text: &str, anchor: Anchor, y: f32, font: FontSpec);

    /// Horizontal rule across the content width.
    fn rule(&mut self, y: f32, stroke: f32);

    /// Stroked rectangle with `text` centered in it.
    fn boxed_text(&mut self, cell: Rect, text: &str, font: FontSpec, stroke: f32);

    /// Greyscale raster stretched over `at`.
    fn image(&mut self, raster: &GrayImage, at: Rect);

    /// Finish the current page and continue on a fresh one.
    fn new_page(&mut self);
}

// ============================================================================
// PDF CANVAS
// ============================================================================

pub struct PdfCanvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    geometry: Geometry,
    pages: usize,
}

impl PdfCanvas {
    pub fn new(title: &str, geometry: Geometry) -> Result<Self, RenderError> {
        let (doc, page1, layer1) = PdfDocument::new(
            title,
            Mm(geometry.page_width * PT_TO_MM),
            Mm(geometry.page_height * PT_TO_MM),
            LAYER_NAME,
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Emit(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Emit(e.to_string()))?;
        let layer = doc.get_page(page1).get_layer(layer1);
        set_black(&layer);

        Ok(PdfCanvas {
            doc,
            layer,
            regular,
            bold,
            geometry,
            pages: 1,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Serialize the document.
    pub fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut writer = BufWriter::new(cursor);
            self.doc
                .save(&mut writer)
                .map_err(|e| RenderError::Emit(e.to_string()))?;
        }
        Ok(buf)
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold {
            &self.bold
        } else {
            &self.regular
        }
    }

    fn line(&self, points: &[(f32, f32)], closed: bool) {
        let points = points
            .iter()
            .map(|&(x, y)| (Point::new(Mm(x * PT_TO_MM), Mm(y * PT_TO_MM)), false))
            .collect();
        self.layer.add_line(Line {
            points,
            is_closed: closed,
        });
    }
}

impl Canvas for PdfCanvas {
    fn text(&mut self, text: &str, anchor: Anchor, y: f32, font: FontSpec) {
        let x = anchor.start(font.width(text));
        self.layer.use_text(
            text,
            font.size,
            Mm(x * PT_TO_MM),
            Mm(y * PT_TO_MM),
            self.font(font.bold),
        );
    }

    fn rule(&mut self, y: f32, stroke: f32) {
        let left = self.geometry.margin;
        let right = self.geometry.page_width - self.geometry.margin;
        self.layer.set_outline_thickness(stroke);
        self.line(&[(left, y), (right, y)], false);
    }

    fn boxed_text(&mut self, cell: Rect, text: &str, font: FontSpec, stroke: f32) {
        self.layer.set_outline_thickness(stroke);
        self.line(
            &[
                (cell.x, cell.y),
                (cell.x + cell.w, cell.y),
                (cell.x + cell.w, cell.y + cell.h),
                (cell.x, cell.y + cell.h),
            ],
            true,
        );

        // Center the cap height on the cell's middle.
        let cap = get_metrics(font.bold).ascender as f32 / 1000.0 * font.size;
        let baseline = cell.y + (cell.h - cap) / 2.0;
        self.text(text, Anchor::Center(cell.x + cell.w / 2.0), baseline, font);
    }

    fn image(&mut self, raster: &GrayImage, at: Rect) {
        let (width, height) = raster.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let image = Image::from(ImageXObject {
            width: Px(width as usize),
            height: Px(height as usize),
            color_space: ColorSpace::Greyscale,
            bits_per_component: ColorBits::Bit8,
            interpolate: false,
            image_data: raster.as_raw().clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // At 72 DPI one pixel is one point, so the scale is the target size
        // over the pixel size.
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(at.x * PT_TO_MM)),
                translate_y: Some(Mm(at.y * PT_TO_MM)),
                scale_x: Some(at.w / width as f32),
                scale_y: Some(at.h / height as f32),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.geometry.page_width * PT_TO_MM),
            Mm(self.geometry.page_height * PT_TO_MM),
            LAYER_NAME,
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        set_black(&self.layer);
        self.pages += 1;
    }
}

fn set_black(layer: &PdfLayerReference) {
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;

    #[test]
    fn anchors() {
        assert_eq!(Anchor::Left(10.0).start(20.0), 10.0);
        assert_eq!(Anchor::Center(50.0).start(20.0), 40.0);
        assert_eq!(Anchor::Right(100.0).start(20.0), 80.0);
    }

    #[test]
    fn emits_a_pdf() {
        let geometry = RenderConfig::default().geometry();
        let mut canvas = PdfCanvas::new("Receipt", geometry).unwrap();
        let font = FontSpec::new(9.0, false);
        canvas.text("Fature Tatimore", Anchor::Center(geometry.page_width / 2.0), 800.0, font);
        canvas.rule(790.0, 0.5);
        canvas.boxed_text(
            Rect {
                x: geometry.margin,
                y: 760.0,
                w: 50.0,
                h: 15.6,
            },
            "TVSH",
            FontSpec::new(9.0, true),
            0.3,
        );
        canvas.image(
            &GrayImage::from_pixel(4, 4, image::Luma([0u8])),
            Rect {
                x: 70.0,
                y: 600.0,
                w: 85.0,
                h: 85.0,
            },
        );
        let bytes = canvas.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn counts_pages() {
        let geometry = RenderConfig::default().geometry();
        let mut canvas = PdfCanvas::new("Receipt", geometry).unwrap();
        canvas.new_page();
        canvas.text("Faqe 2", Anchor::Left(geometry.margin), 800.0, FontSpec::new(9.0, false));
        assert_eq!(canvas.page_count(), 2);
        assert!(!canvas.finish().unwrap().is_empty());
    }
}
