//! QR embedding for the fiscal verification code.
//!
//! The producer leaves a vector-graphic placeholder where the code belongs
//! and prints the code itself as text (`NIVF: ...`) somewhere in the same
//! table. The payload is lifted from that text and encoded here.

use image::{GrayImage, Luma};
use log::{debug, warn};
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};

use crate::config::{Geometry, RenderConfig, MM};
use crate::document::{Element, Node};
use crate::flow::PageFlow;
use crate::pdf::{Canvas, Rect};
use crate::section::RenderState;

/// Blank modules around the symbol.
const QUIET_ZONE: usize = 1;
/// Raster pixels per module.
const MODULE_PX: u32 = 4;
/// Gap above and below the image, in millimetres.
const QR_GAP_MM: f32 = 3.0;

// ============================================================================
// PAYLOAD
// ============================================================================

/// Text after the first colon of the first table row carrying one of
/// `labels`. `None` when no row does or the value is blank.
pub fn find_code_payload(table: &Element, labels: &[String]) -> Option<String> {
    let mut rows = Vec::new();
    collect_rows(table, &mut rows);

    let text = rows
        .iter()
        .map(|row| row.text())
        .find(|text| labels.iter().any(|label| text.contains(label.as_str())))?;
    let payload = text.split_once(':').map(|(_, rest)| rest.trim())?;
    if payload.is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}

fn collect_rows<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    for child in &el.children {
        if let Node::Element(child) = child {
            if child.is("tr") {
                out.push(child);
            } else {
                collect_rows(child, out);
            }
        }
    }
}

// ============================================================================
// RASTER
// ============================================================================

/// Encode `payload` at error-correction level L as a black-on-white raster.
pub fn qr_raster(payload: &str) -> Result<GrayImage, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)?;
    let modules = code.width();
    let colors = code.to_colors();
    let side = ((modules + 2 * QUIET_ZONE) as u32) * MODULE_PX;

    Ok(GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / MODULE_PX) as usize;
        let my = (y / MODULE_PX) as usize;
        let inside = (QUIET_ZONE..QUIET_ZONE + modules).contains(&mx)
            && (QUIET_ZONE..QUIET_ZONE + modules).contains(&my);
        let dark = inside
            && colors[(my - QUIET_ZONE) * modules + (mx - QUIET_ZONE)] == Color::Dark;
        if dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    }))
}

// ============================================================================
// EMBEDDER
// ============================================================================

pub struct QrEmbedder<'a> {
    config: &'a RenderConfig,
    geometry: Geometry,
    flow: PageFlow,
}

impl<'a> QrEmbedder<'a> {
    pub fn new(config: &'a RenderConfig, geometry: Geometry) -> Self {
        QrEmbedder {
            config,
            geometry,
            flow: PageFlow::new(geometry),
        }
    }

    /// Draw the code found in `table` centered at the cursor. Returns false,
    /// leaving the cursor untouched, when there is no code or it cannot be
    /// encoded.
    pub fn embed<C: Canvas>(
        &self,
        table: Option<&Element>,
        state: &mut RenderState,
        canvas: &mut C,
    ) -> bool {
        let payload = table.and_then(|t| find_code_payload(t, &self.config.code_labels));
        let Some(payload) = payload else {
            debug!("Code placeholder without a code label, skipping");
            return false;
        };
        let raster = match qr_raster(&payload) {
            Ok(raster) => raster,
            Err(e) => {
                warn!("Could not generate QR code: {}", e);
                return false;
            }
        };

        let size = self.config.qr_size_mm * MM;
        let gap = QR_GAP_MM * MM;
        self.flow.ensure_room(state, canvas, gap + size + gap);

        state.y -= gap;
        canvas.image(
            &raster,
            Rect {
                x: (self.geometry.page_width - size) / 2.0,
                y: state.y - size,
                w: size,
                h: size,
            },
        );
        state.y -= size + gap;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, Segment};
    use crate::trace::{DrawOp, TraceCanvas};

    fn labels() -> Vec<String> {
        RenderConfig::default().code_labels
    }

    fn first_table(doc: &Document) -> &Element {
        match doc.segments().into_iter().next() {
            Some(Segment::Table(table)) => table,
            _ => panic!("expected a table"),
        }
    }

    #[test]
    fn payload_follows_the_first_colon() {
        let doc = Document::parse(
            "<table><tfoot>
               <tr><td>RHTXZGJJT019K0251917P028301001107</td></tr>
               <tr><td>NIVF: BBBBBBBBBBBBBBBBB</td></tr>
               <tr><td>NSLF: CCCC</td></tr>
               <tr><td><svg></svg></td></tr>
             </tfoot></table>",
        )
        .unwrap();
        assert_eq!(
            find_code_payload(first_table(&doc), &labels()),
            Some("BBBBBBBBBBBBBBBBB".to_string())
        );
    }

    #[test]
    fn no_label_or_blank_value_means_no_payload() {
        let doc = Document::parse("<table><tr><td>Faleminderit</td></tr></table>").unwrap();
        assert_eq!(find_code_payload(first_table(&doc), &labels()), None);

        let doc = Document::parse("<table><tr><td>NSLF:</td></tr></table>").unwrap();
        assert_eq!(find_code_payload(first_table(&doc), &labels()), None);
    }

    #[test]
    fn raster_has_a_quiet_zone() {
        let raster = qr_raster("BBBBBBBBBBBBBBBBB").unwrap();
        let (w, h) = raster.dimensions();
        assert_eq!(w, h);
        // Version 1 is 21 modules wide, plus one quiet module per side.
        assert_eq!(w, 23 * MODULE_PX);
        assert_eq!(raster.get_pixel(0, 0), &Luma([255u8]));
        assert_eq!(raster.get_pixel(MODULE_PX, MODULE_PX), &Luma([0u8]));
    }

    #[test]
    fn embed_draws_centered_and_advances() {
        let config = RenderConfig::default();
        let geometry = config.geometry();
        let embedder = QrEmbedder::new(&config, geometry);
        let doc = Document::parse("<table><tr><td>NIVF: abc-123</td></tr></table>").unwrap();
        let mut canvas = TraceCanvas::default();
        let mut state = RenderState::new(geometry.top);

        assert!(embedder.embed(Some(first_table(&doc)), &mut state, &mut canvas));
        let advance = geometry.top - state.y;
        assert!((advance - 36.0 * MM).abs() < 0.01);
        match canvas.ops() {
            [DrawOp::Image { rect }] => {
                assert!((rect.x + rect.w / 2.0 - geometry.page_width / 2.0).abs() < 0.01);
                assert!((rect.w - 30.0 * MM).abs() < 0.01);
            }
            other => panic!("unexpected ops {other:?}"),
        }
    }

    #[test]
    fn missing_code_leaves_the_cursor_alone() {
        let config = RenderConfig::default();
        let geometry = config.geometry();
        let embedder = QrEmbedder::new(&config, geometry);
        let mut canvas = TraceCanvas::default();
        let mut state = RenderState::new(geometry.top);
        assert!(!embedder.embed(None, &mut state, &mut canvas));
        assert_eq!(state.y, geometry.top);
        assert!(canvas.ops().is_empty());
    }
}
