//! Row layout.
//!
//! Every row is reduced once to [`RowFacts`] (its shape and the bits of
//! structure the state machine needs), then drawn by [`LayoutEngine`]
//! according to the [`Plan`] the tracker chose. All lengths are points;
//! the vertical rhythm constants are millimetres.

use log::{debug, warn};

use crate::config::{Geometry, RenderConfig, MM};
use crate::document::{Cell, Origin, Row};
use crate::flow::PageFlow;
use crate::pdf::{Anchor, Canvas, FontSpec, Rect};
use crate::qr::QrEmbedder;
use crate::section::{Plan, RenderState, Strategy};
use crate::stylesheet::{scale_font_size, Stylesheet, TextAlign, MIN_FONT_SIZE};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Separator rule stroke width.
pub const RULE_STROKE: f32 = 0.5;
/// Tax grid border stroke width.
pub const GRID_STROKE: f32 = 0.3;

/// Line height per point of font size, in millimetres.
const LINE_HEIGHT_MM_PER_PT: f32 = 0.35;
/// Extra step between lines split at `<br>`.
const BREAK_GAP_MM: f32 = 1.5;
/// Extra step between wrapped continuation lines.
const WRAP_GAP_MM: f32 = 0.8;
/// Extra space after order-ticket rows and body item rows.
const ROW_EXTRA_MM: f32 = 2.0;
/// Right-hand padding inside wrapped columns.
const COLUMN_PAD_MM: f32 = 2.0;
/// Horizontal padding inside tax grid cells, in points.
const GRID_PAD: f32 = 2.0;
/// Tax grid text shrinks in these steps until it fits.
const GRID_SHRINK_STEP: f32 = 0.5;

const BODY_DEFAULT_SIZE: u32 = 9;
const HEADER_DEFAULT_SIZE: u32 = 10;
const H1_MIN_SIZE: f32 = 12.0;
const H2_MIN_SIZE: f32 = 10.0;

/// Label/value column shares, in characters of the monospaced layout the
/// producer designs for.
const RIGHT_VALUE_SPLIT: (f32, f32) = (35.0, 10.0);
const LEFT_VALUE_SPLIT: (f32, f32) = (25.0, 20.0);

// ============================================================================
// ROW SHAPE
// ============================================================================

/// Row classification by count of non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// No text at all
    Blank,
    /// No text, but a code placeholder
    Placeholder,
    /// One non-empty cell
    Single,
    /// Quantity and item name in a body row
    OrderTicket,
    /// Two non-empty cells
    Pair,
    /// Four non-empty cells
    Quad,
    /// Three, five or more non-empty cells
    Other,
}

/// Structure of a row, computed once before any drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFacts {
    pub shape: RowShape,
    pub origin: Origin,
    /// Texts of the non-empty cells, in column order
    pub texts: Vec<String>,
    /// Classes of the row (or block wrapper) and of its first non-empty cell
    pub classes: Vec<String>,
    /// Some non-empty cell is a `th`
    pub header: bool,
    /// Some non-empty cell holds an `h1` or `h2`
    pub heading: bool,
}

impl RowFacts {
    pub fn analyze(row: &Row) -> RowFacts {
        let filled: Vec<&Cell> = row.cells.iter().filter(|c| !c.is_empty()).collect();
        let texts: Vec<String> = filled.iter().map(|c| c.text.clone()).collect();
        let header = filled.iter().any(|c| c.header);
        let heading = filled.iter().any(|c| c.element.holds_any(&["h1", "h2"]));

        let mut classes = row.context_classes.clone();
        if let Some(first) = filled.first() {
            classes.extend(first.element.classes.iter().cloned());
        }

        let shape = match texts.len() {
            0 if row.cells.iter().any(|c| c.element.has_code_placeholder()) => {
                RowShape::Placeholder
            }
            0 => RowShape::Blank,
            1 => RowShape::Single,
            2 if row.origin == Origin::Body && !heading && has_quantity_token(&texts[0]) => {
                RowShape::OrderTicket
            }
            2 => RowShape::Pair,
            4 => RowShape::Quad,
            _ => RowShape::Other,
        };

        RowFacts {
            shape,
            origin: row.origin,
            texts,
            classes,
            header,
            heading,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// `2 x`, `2x`, `x2` or a bare multiplication sign.
fn has_quantity_token(text: &str) -> bool {
    text.split_whitespace().any(|token| {
        let token = token.to_lowercase();
        if token == "x" || token == "×" {
            return true;
        }
        let number = token
            .strip_suffix('x')
            .or_else(|| token.strip_prefix('x'))
            .or_else(|| token.strip_suffix('×'));
        number.is_some_and(|n| !n.is_empty() && n.replace(',', ".").parse::<f32>().is_ok())
    })
}

// ============================================================================
// WORD WRAP
// ============================================================================

/// Greedy wrap on whitespace. Words are never split, so a single word wider
/// than `width` gets a line of its own.
pub fn wrap(text: &str, width: f32, font: FontSpec) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if font.width(&candidate) <= width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ============================================================================
// VERTICAL RHYTHM
// ============================================================================

fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT_MM_PER_PT * MM
}

/// Space below a finished row.
fn row_spacing(size: f32) -> f32 {
    let mm = if size >= 14.0 {
        1.5
    } else if size >= 12.0 {
        1.2
    } else {
        0.8
    };
    mm * MM
}

fn wrap_step(size: f32) -> f32 {
    line_height(size) + WRAP_GAP_MM * MM
}

/// Gaps above and below a separator rule, in millimetres.
#[derive(Debug, Clone, Copy)]
struct RuleGaps {
    above: f32,
    below: f32,
}

const RULE_BEFORE: RuleGaps = RuleGaps {
    above: 2.0,
    below: 3.0,
};
const RULE_AFTER: RuleGaps = RuleGaps {
    above: 1.0,
    below: 2.0,
};
const ITEM_RULE_BEFORE: RuleGaps = RuleGaps {
    above: 1.0,
    below: 3.0,
};
const ITEM_RULE_AFTER: RuleGaps = RuleGaps {
    above: 3.0,
    below: 1.0,
};

// ============================================================================
// ROW STYLE
// ============================================================================

/// Resolved font for a whole row plus per-cell alignment.
#[derive(Debug, Clone)]
struct RowStyle {
    font: FontSpec,
    aligns: Vec<TextAlign>,
}

/// A column of a multi-cell row.
struct Column<'t> {
    x: f32,
    width: f32,
    text: &'t str,
    align: TextAlign,
}

impl Column<'_> {
    fn anchor(&self) -> Anchor {
        match self.align {
            TextAlign::Left => Anchor::Left(self.x),
            TextAlign::Center => Anchor::Center(self.x + self.width / 2.0),
            TextAlign::Right => Anchor::Right(self.x + self.width),
        }
    }
}

// ============================================================================
// LAYOUT ENGINE
// ============================================================================

pub struct LayoutEngine<'a> {
    config: &'a RenderConfig,
    stylesheet: &'a Stylesheet,
    geometry: Geometry,
    flow: PageFlow,
    qr: QrEmbedder<'a>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a RenderConfig, stylesheet: &'a Stylesheet) -> Self {
        let geometry = config.geometry();
        LayoutEngine {
            config,
            stylesheet,
            geometry,
            flow: PageFlow::new(geometry),
            qr: QrEmbedder::new(config, geometry),
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Draw one row according to `plan`, advancing the cursor.
    pub fn draw<C: Canvas>(
        &self,
        row: &Row,
        facts: &RowFacts,
        plan: &Plan,
        state: &mut RenderState,
        canvas: &mut C,
    ) {
        match plan.strategy {
            Strategy::Blank | Strategy::Dropped => {}
            Strategy::Qr => {
                self.qr.embed(row.table, state, canvas);
            }
            Strategy::TaxGridHeader | Strategy::TaxGridData => {
                if plan.rule_before {
                    self.separator(state, canvas, RULE_BEFORE);
                }
                self.draw_grid_row(facts, plan.strategy == Strategy::TaxGridHeader, state, canvas);
                if plan.rule_after {
                    self.separator(state, canvas, RULE_AFTER);
                }
            }
            Strategy::ItemHeader => {
                let style = self.row_style(row, facts);
                self.separator(state, canvas, ITEM_RULE_BEFORE);
                self.draw_columns(&self.quarter_columns(facts, true), style.font, state, canvas);
                self.separator(state, canvas, ITEM_RULE_AFTER);
                state.y -= line_height(style.font.size) + row_spacing(style.font.size);
            }
            Strategy::FullWidth => {
                let style = self.row_style(row, facts);
                if plan.rule_before {
                    self.separator(state, canvas, RULE_BEFORE);
                }
                self.draw_full_width(row, facts, &style, state, canvas);
                if plan.rule_after {
                    self.separator(state, canvas, RULE_AFTER);
                }
            }
            Strategy::OrderTicket
            | Strategy::LabelValue
            | Strategy::ItemRow
            | Strategy::Fallback => {
                let style = self.row_style(row, facts);
                if plan.rule_before {
                    self.separator(state, canvas, RULE_BEFORE);
                }
                self.draw_multi_cell(facts, plan.strategy, &style, state, canvas);
                state.y -= line_height(style.font.size) + row_spacing(style.font.size);
                if plan.rule_after {
                    self.separator(state, canvas, RULE_AFTER);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Style
    // ------------------------------------------------------------------------

    fn row_style(&self, row: &Row, facts: &RowFacts) -> RowStyle {
        let default_size = if facts.header {
            HEADER_DEFAULT_SIZE
        } else {
            BODY_DEFAULT_SIZE
        };
        let styles: Vec<_> = row
            .cells
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| self.stylesheet.resolve(c.element, &c.lineage, default_size))
            .collect();

        let scale = self.config.font_scale;
        let mut size = styles
            .iter()
            .map(|s| s.scaled_size(scale))
            .reduce(f32::max)
            .unwrap_or_else(|| scale_font_size(default_size as f32, scale));
        let mut bold = styles.first().is_some_and(|s| s.bold) || facts.header;

        if facts.heading {
            bold = true;
            let single = facts.shape == RowShape::Single;
            let h1 = row.cells.iter().any(|c| c.element.contains_tag("h1"));
            let floor = if single && !h1 { H2_MIN_SIZE } else { H1_MIN_SIZE };
            size = size.max(floor);
        }

        let mut aligns: Vec<TextAlign> = styles.iter().map(|s| s.align).collect();
        if facts.origin == Origin::Foot && facts.shape == RowShape::Single {
            aligns = vec![TextAlign::Center];
        }

        RowStyle {
            font: FontSpec::new(size, bold),
            aligns,
        }
    }

    // ------------------------------------------------------------------------
    // Strategies
    // ------------------------------------------------------------------------

    fn draw_full_width<C: Canvas>(
        &self,
        row: &Row,
        facts: &RowFacts,
        style: &RowStyle,
        state: &mut RenderState,
        canvas: &mut C,
    ) {
        let Some(cell) = row.cells.iter().find(|c| !c.is_empty()) else {
            return;
        };
        let font = style.font;
        let align = style.aligns.first().copied().unwrap_or_default();
        let anchor = self.page_anchor(align);
        let width = self.geometry.content_width;

        if cell.element.contains_tag("br") {
            // Each piece between breaks is its own line at the same x.
            for part in cell.element.text_segments() {
                for line in wrap(&part, width, font) {
                    self.flow.ensure_room(state, canvas, line_height(font.size));
                    canvas.text(&line, anchor, state.y, font);
                    state.y -= line_height(font.size) + BREAK_GAP_MM * MM;
                }
            }
            return;
        }

        let text = facts.texts.first().map(String::as_str).unwrap_or("");
        for (i, line) in wrap(text, width, font).iter().enumerate() {
            if i > 0 {
                state.y -= wrap_step(font.size);
            }
            self.flow.ensure_room(state, canvas, line_height(font.size));
            canvas.text(line, anchor, state.y, font);
        }
        state.y -= line_height(font.size) + row_spacing(font.size);
    }

    fn draw_multi_cell<C: Canvas>(
        &self,
        facts: &RowFacts,
        strategy: Strategy,
        style: &RowStyle,
        state: &mut RenderState,
        canvas: &mut C,
    ) {
        let margin = self.geometry.margin;
        let content = self.geometry.content_width;
        let pad = COLUMN_PAD_MM * MM;

        match strategy {
            Strategy::OrderTicket => {
                let qty = content * 0.2;
                let columns = [
                    Column {
                        x: margin,
                        width: qty - pad,
                        text: &facts.texts[0],
                        align: TextAlign::Left,
                    },
                    Column {
                        x: margin + qty,
                        width: content - qty - pad,
                        text: &facts.texts[1],
                        align: TextAlign::Left,
                    },
                ];
                self.draw_columns(&columns, style.font, state, canvas);
                state.y -= ROW_EXTRA_MM * MM;
            }
            Strategy::LabelValue => {
                let value_align = style.aligns.get(1).copied().unwrap_or_default();
                let columns = self.label_value_columns(facts, value_align, style.font);
                self.draw_columns(&columns, style.font, state, canvas);
            }
            Strategy::ItemRow => {
                self.draw_columns(&self.quarter_columns(facts, false), style.font, state, canvas);
                if facts.origin == Origin::Body {
                    state.y -= ROW_EXTRA_MM * MM;
                }
            }
            _ => {
                warn!(
                    "Unclassified row with {} cells, joining: {:?}",
                    facts.texts.len(),
                    facts.texts
                );
                let joined = facts.texts.join("  ");
                let column = Column {
                    x: margin,
                    width: content,
                    text: &joined,
                    align: TextAlign::Left,
                };
                self.draw_columns(&[column], style.font, state, canvas);
            }
        }
    }

    /// Label on the left, value placed by the value cell's alignment.
    fn label_value_columns<'t>(
        &self,
        facts: &'t RowFacts,
        value_align: TextAlign,
        font: FontSpec,
    ) -> [Column<'t>; 2] {
        let margin = self.geometry.margin;
        let content = self.geometry.content_width;
        let gap = COLUMN_PAD_MM * MM;
        let (label, value) = (&facts.texts[0], &facts.texts[1]);

        let value_width = match value_align {
            TextAlign::Center => content / 2.0,
            TextAlign::Right => {
                let (l, v) = RIGHT_VALUE_SPLIT;
                let share = content * v / (l + v);
                share.max(font.width(value).min(content / 2.0))
            }
            TextAlign::Left => {
                let (l, v) = LEFT_VALUE_SPLIT;
                content * v / (l + v)
            }
        };
        let label_width = content - value_width;

        [
            Column {
                x: margin,
                width: label_width - gap,
                text: label,
                align: TextAlign::Left,
            },
            Column {
                x: margin + label_width,
                width: value_width,
                text: value,
                align: value_align,
            },
        ]
    }

    /// Four equal columns. Headers center every column; data rows keep the
    /// description left-aligned with padding and center the rest.
    fn quarter_columns<'t>(&self, facts: &'t RowFacts, header: bool) -> Vec<Column<'t>> {
        let width = self.geometry.content_width / 4.0;
        facts
            .texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let x = self.geometry.margin + i as f32 * width;
                if i == 0 && !header {
                    Column {
                        x,
                        width: width - COLUMN_PAD_MM * MM,
                        text,
                        align: TextAlign::Left,
                    }
                } else {
                    Column {
                        x,
                        width,
                        text,
                        align: TextAlign::Center,
                    }
                }
            })
            .collect()
    }

    /// Wrap every column on its own and draw them line by line. The first
    /// lines share the cursor; the cursor ends on the last line drawn.
    fn draw_columns<C: Canvas>(
        &self,
        columns: &[Column],
        font: FontSpec,
        state: &mut RenderState,
        canvas: &mut C,
    ) {
        let wrapped: Vec<Vec<String>> = columns
            .iter()
            .map(|col| wrap(col.text, col.width, font))
            .collect();
        let depth = wrapped.iter().map(Vec::len).max().unwrap_or(0);

        for i in 0..depth {
            if i > 0 {
                state.y -= wrap_step(font.size);
            }
            self.flow.ensure_room(state, canvas, line_height(font.size));
            for (col, lines) in columns.iter().zip(&wrapped) {
                if let Some(line) = lines.get(i) {
                    canvas.text(line, col.anchor(), state.y, font);
                }
            }
        }
    }

    /// One bordered row of the tax grid; the text shrinks until every cell
    /// fits.
    fn draw_grid_row<C: Canvas>(
        &self,
        facts: &RowFacts,
        header: bool,
        state: &mut RenderState,
        canvas: &mut C,
    ) {
        let count = facts.texts.len().max(1);
        let cell_width = self.geometry.content_width / count as f32;
        let height = self.config.tax_grid_row_height_mm * MM;

        let mut font = FontSpec::new(self.config.tax_grid_font_size.max(MIN_FONT_SIZE), header);
        while font.size > MIN_FONT_SIZE
            && facts
                .texts
                .iter()
                .any(|t| font.width(t) > cell_width - 2.0 * GRID_PAD)
        {
            font.size = (font.size - GRID_SHRINK_STEP).max(MIN_FONT_SIZE);
        }
        debug!("Tax grid row at {}pt: {:?}", font.size, facts.texts);

        self.flow.ensure_room(state, canvas, height);
        for (i, text) in facts.texts.iter().enumerate() {
            let cell = Rect {
                x: self.geometry.margin + i as f32 * cell_width,
                y: state.y - height,
                w: cell_width,
                h: height,
            };
            canvas.boxed_text(cell, text, font, GRID_STROKE);
        }
        state.y -= height;
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn separator<C: Canvas>(&self, state: &mut RenderState, canvas: &mut C, gaps: RuleGaps) {
        self.flow.ensure_room(state, canvas, gaps.above * MM);
        state.y -= gaps.above * MM;
        canvas.rule(state.y, RULE_STROKE);
        state.y -= gaps.below * MM;
    }

    fn page_anchor(&self, align: TextAlign) -> Anchor {
        match align {
            TextAlign::Left => Anchor::Left(self.geometry.margin),
            TextAlign::Center => Anchor::Center(self.geometry.page_width / 2.0),
            TextAlign::Right => Anchor::Right(self.geometry.page_width - self.geometry.margin),
        }
    }
}
