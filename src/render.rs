//! Render pipeline: markup -> walker -> section tracker -> layout -> canvas.

use log::{debug, info};
use std::path::Path;

use crate::config::RenderConfig;
use crate::document::Document;
use crate::error::RenderError;
use crate::layout::{LayoutEngine, RowFacts};
use crate::pdf::{Canvas, PdfCanvas};
use crate::section::{RenderState, SectionTracker};
use crate::stylesheet::Stylesheet;
use crate::trace::{Trace, TraceCanvas, TraceRow};

const DOCUMENT_TITLE: &str = "Receipt";

/// Turns receipt markup into a PDF. Holds only configuration, so one
/// renderer can serve any number of jobs, each with its own state.
#[derive(Debug, Clone, Default)]
pub struct ReceiptRenderer {
    config: RenderConfig,
}

impl ReceiptRenderer {
    pub fn new(config: RenderConfig) -> Self {
        ReceiptRenderer { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `markup` to PDF bytes.
    pub fn render(&self, markup: &str) -> Result<Vec<u8>, RenderError> {
        info!(
            "Rendering receipt: {} bytes of markup, font scale {}",
            markup.len(),
            self.config.font_scale
        );
        let document = Document::parse(markup)?;
        let mut canvas = PdfCanvas::new(DOCUMENT_TITLE, self.config.geometry())?;
        self.run(&document, &mut canvas, |_| {});

        let pages = canvas.page_count();
        let bytes = canvas.finish()?;
        info!("Receipt PDF created: {} page(s), {} bytes", pages, bytes.len());
        Ok(bytes)
    }

    /// Render `markup` and write the PDF to `path`.
    pub fn render_to_file(&self, markup: &str, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        let bytes = self.render(markup)?;
        std::fs::write(path, bytes)?;
        info!("Receipt PDF written to {}", path.display());
        Ok(())
    }

    /// Dry run: the draw operations and per-row classification, without
    /// producing a PDF.
    pub fn trace(&self, markup: &str) -> Result<Trace, RenderError> {
        let document = Document::parse(markup)?;
        let mut canvas = TraceCanvas::default();
        let mut rows = Vec::new();
        let state = self.run(&document, &mut canvas, |row| rows.push(row));

        Ok(Trace {
            ops: canvas.into_ops(),
            rows,
            final_section: state.last_section,
            pages: state.page + 1,
        })
    }

    fn run<C, F>(&self, document: &Document, canvas: &mut C, mut observe: F) -> RenderState
    where
        C: Canvas,
        F: FnMut(TraceRow),
    {
        let stylesheet = Stylesheet::parse(&document.style_text)
            .with_font_overrides(&self.config.class_font_overrides);
        debug!("Stylesheet has {} rules", stylesheet.rule_count());

        let engine = LayoutEngine::new(&self.config, &stylesheet);
        let tracker = SectionTracker::new(&self.config);
        let mut state = RenderState::new(engine.geometry().top);

        for segment in document.segments() {
            for row in segment.rows() {
                let facts = RowFacts::analyze(&row);
                let plan = tracker.plan(&facts, &mut state);
                debug!(
                    "Row {:?} -> {} (section {})",
                    facts.texts,
                    plan.strategy.name(),
                    state.last_section.name()
                );
                engine.draw(&row, &facts, &plan, &mut state, canvas);
                observe(TraceRow {
                    texts: facts.texts,
                    strategy: plan.strategy,
                    section: state.last_section,
                });
            }
        }
        state
    }
}
