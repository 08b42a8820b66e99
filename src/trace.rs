//! Recording canvas and classification trace.
//!
//! [`TraceCanvas`] stores every primitive instead of drawing it, which is
//! what the engine tests and [`crate::ReceiptRenderer::trace`] run against.

use image::GrayImage;

use crate::pdf::{Anchor, Canvas, FontSpec, Rect};
use crate::section::{Section, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        /// Start x after anchoring
        x: f32,
        y: f32,
        font: FontSpec,
    },
    Rule {
        y: f32,
        stroke: f32,
    },
    Cell {
        rect: Rect,
        text: String,
        font: FontSpec,
    },
    Image {
        rect: Rect,
    },
    PageBreak,
}

#[derive(Debug, Default)]
pub struct TraceCanvas {
    ops: Vec<DrawOp>,
}

impl TraceCanvas {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }
}

impl Canvas for TraceCanvas {
    fn text(&mut self, text: &str, anchor: Anchor, y: f32, font: FontSpec) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x: anchor.start(font.width(text)),
            y,
            font,
        });
    }

    fn rule(&mut self, y: f32, stroke: f32) {
        self.ops.push(DrawOp::Rule { y, stroke });
    }

    fn boxed_text(&mut self, cell: Rect, text: &str, font: FontSpec, _stroke: f32) {
        self.ops.push(DrawOp::Cell {
            rect: cell,
            text: text.to_string(),
            font,
        });
    }

    fn image(&mut self, _raster: &GrayImage, at: Rect) {
        self.ops.push(DrawOp::Image { rect: at });
    }

    fn new_page(&mut self) {
        self.ops.push(DrawOp::PageBreak);
    }
}

/// How one row was classified.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    /// Non-empty cell texts
    pub texts: Vec<String>,
    pub strategy: Strategy,
    /// `last_section` after the row
    pub section: Section,
}

/// Result of a dry run.
#[derive(Debug, Clone)]
pub struct Trace {
    pub ops: Vec<DrawOp>,
    pub rows: Vec<TraceRow>,
    pub final_section: Section,
    pub pages: usize,
}

impl Trace {
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } | DrawOp::Cell { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, strategy: Strategy) -> usize {
        self.rows.iter().filter(|row| row.strategy == strategy).count()
    }

    pub fn images(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }

    pub fn rules(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rule { .. }))
            .count()
    }

    /// Every font size used for text or grid cells.
    pub fn font_sizes(&self) -> Vec<f32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { font, .. } | DrawOp::Cell { font, .. } => Some(font.size),
                _ => None,
            })
            .collect()
    }
}
