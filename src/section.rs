//! Section state machine.
//!
//! Classifies every row into a drawing [`Strategy`], decides where the engine
//! draws separator rules, and deduplicates the tax-summary grid the upstream
//! producer tends to emit twice. Nothing here touches a page: the tracker
//! only reads [`RowFacts`] and mutates [`RenderState`].

use log::debug;

use crate::config::RenderConfig;
use crate::document::Origin;
use crate::layout::{RowFacts, RowShape};

/// Keywords of the tax-summary grid.
const TAX_TYPE: &str = "Tipi";
const TAX_VAT: &str = "TVSH";

// ============================================================================
// STATE
// ============================================================================

/// The semantic zone the last drawn row belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    #[default]
    None,
    CompanyHeader,
    ReceiptInfo,
    AfterLabeledLine,
    Totali,
    TableHeader,
    TaxTableHeader,
    TaxTableComplete,
    FooterLineAdded,
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::None => "none",
            Section::CompanyHeader => "company_header",
            Section::ReceiptInfo => "receipt_info",
            Section::AfterLabeledLine => "after_labeled_line",
            Section::Totali => "totali",
            Section::TableHeader => "table_header",
            Section::TaxTableHeader => "tax_table_header",
            Section::TaxTableComplete => "tax_table_complete",
            Section::FooterLineAdded => "footer_line_added",
        }
    }
}

/// Mutable state of one render job.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    /// Vertical cursor in points, PDF orientation (decreases down the page).
    pub y: f32,
    /// Zero-based index of the page being drawn.
    pub page: usize,
    pub last_section: Section,
    /// A tax grid header and data row have been drawn. Never cleared.
    pub tax_grid_done: bool,
    /// The previous row was a dropped duplicate grid header, so this row is
    /// its duplicate data row.
    pub swallow_tax_data: bool,
}

impl RenderState {
    pub fn new(top: f32) -> Self {
        RenderState {
            y: top,
            page: 0,
            last_section: Section::None,
            tax_grid_done: false,
            swallow_tax_data: false,
        }
    }
}

// ============================================================================
// PLAN
// ============================================================================

/// How the layout engine draws a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// No text and nothing to embed.
    Blank,
    /// Code placeholder; becomes a QR image when the table carries a code.
    Qr,
    FullWidth,
    OrderTicket,
    LabelValue,
    ItemHeader,
    ItemRow,
    /// Unclassifiable multi-cell row, joined into one line.
    Fallback,
    TaxGridHeader,
    TaxGridData,
    /// Duplicate tax grid row.
    Dropped,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Blank => "blank",
            Strategy::Qr => "qr",
            Strategy::FullWidth => "full_width",
            Strategy::OrderTicket => "order_ticket",
            Strategy::LabelValue => "label_value",
            Strategy::ItemHeader => "item_header",
            Strategy::ItemRow => "item_row",
            Strategy::Fallback => "fallback",
            Strategy::TaxGridHeader => "tax_grid_header",
            Strategy::TaxGridData => "tax_grid_data",
            Strategy::Dropped => "dropped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub strategy: Strategy,
    /// Separator rule above the row
    pub rule_before: bool,
    /// Separator rule below the row
    pub rule_after: bool,
}

impl Plan {
    fn plain(strategy: Strategy) -> Self {
        Plan {
            strategy,
            rule_before: false,
            rule_after: false,
        }
    }

    fn dropped() -> Self {
        Plan::plain(Strategy::Dropped)
    }
}

// ============================================================================
// TRACKER
// ============================================================================

pub struct SectionTracker<'a> {
    config: &'a RenderConfig,
}

impl<'a> SectionTracker<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        SectionTracker { config }
    }

    /// Classify one row and advance the section state.
    ///
    /// Tax grid triggers run first, for every row with two or more non-empty
    /// cells; everything else dispatches on the row shape.
    pub fn plan(&self, facts: &RowFacts, state: &mut RenderState) -> Plan {
        let swallow = std::mem::take(&mut state.swallow_tax_data);

        if facts.texts.len() >= 2 {
            if let Some(plan) = self.tax_plan(facts, state, swallow) {
                return plan;
            }
        }

        match facts.shape {
            RowShape::Blank => Plan::plain(Strategy::Blank),
            RowShape::Placeholder => Plan::plain(Strategy::Qr),
            RowShape::Single => self.full_width_plan(facts, state),
            RowShape::OrderTicket => Plan::plain(Strategy::OrderTicket),
            RowShape::Pair => self.label_value_plan(facts, state),
            RowShape::Quad if facts.header => {
                state.last_section = Section::TableHeader;
                Plan {
                    strategy: Strategy::ItemHeader,
                    rule_before: true,
                    rule_after: true,
                }
            }
            RowShape::Quad => Plan::plain(Strategy::ItemRow),
            RowShape::Other => Plan::plain(Strategy::Fallback),
        }
    }

    fn tax_plan(&self, facts: &RowFacts, state: &mut RenderState, swallow: bool) -> Option<Plan> {
        if is_tax_header(&facts.texts) {
            if state.tax_grid_done {
                debug!("Dropping repeated tax grid header");
                state.swallow_tax_data = true;
                return Some(Plan::dropped());
            }
            if state.last_section == Section::TaxTableHeader {
                debug!("Dropping duplicate tax grid header");
                return Some(Plan::dropped());
            }
            state.last_section = Section::TaxTableHeader;
            return Some(Plan {
                strategy: Strategy::TaxGridHeader,
                rule_before: true,
                rule_after: false,
            });
        }

        if state.last_section == Section::TaxTableHeader {
            state.last_section = Section::TaxTableComplete;
            state.tax_grid_done = true;
            return Some(Plan {
                strategy: Strategy::TaxGridData,
                rule_before: false,
                rule_after: true,
            });
        }

        if state.tax_grid_done && (swallow || is_tax_like(&facts.texts)) {
            debug!("Dropping repeated tax grid row {:?}", facts.texts);
            return Some(Plan::dropped());
        }
        None
    }

    fn full_width_plan(&self, facts: &RowFacts, state: &mut RenderState) -> Plan {
        let mut plan = Plan::plain(Strategy::FullWidth);
        let text = facts.texts.first().map(String::as_str).unwrap_or("");

        if facts.origin == Origin::Foot
            && state.last_section != Section::FooterLineAdded
            && self.config.attribution_markers.iter().any(|m| text.contains(m.as_str()))
        {
            plan.rule_before = true;
            state.last_section = Section::FooterLineAdded;
        }

        if facts.has_class(&self.config.footer_class) {
            state.last_section = Section::CompanyHeader;
        } else if facts.has_class(&self.config.info_class)
            && state.last_section == Section::CompanyHeader
        {
            plan.rule_before = true;
            state.last_section = Section::ReceiptInfo;
        }

        if self.is_labeled_line(text, false) {
            plan.rule_after = true;
            state.last_section = Section::AfterLabeledLine;
        }
        plan
    }

    fn label_value_plan(&self, facts: &RowFacts, state: &mut RenderState) -> Plan {
        let mut plan = Plan::plain(Strategy::LabelValue);
        if facts.heading {
            plan.rule_before = true;
            state.last_section = Section::Totali;
        }
        let label = facts.texts.first().map(String::as_str).unwrap_or("");
        if self.is_labeled_line(label, true) {
            plan.rule_after = true;
            state.last_section = Section::AfterLabeledLine;
        }
        plan
    }

    /// Table-number or payment-method line. A label cell must end with the
    /// marker; a full-width line only has to contain it.
    fn is_labeled_line(&self, text: &str, label_only: bool) -> bool {
        self.config.labeled_line_markers.iter().any(|marker| {
            if label_only {
                text.trim_end().ends_with(marker.as_str())
            } else {
                text.contains(marker.as_str())
            }
        })
    }
}

fn is_tax_header(texts: &[String]) -> bool {
    texts.iter().any(|t| t == TAX_TYPE) && texts.iter().any(|t| t == TAX_VAT)
}

fn is_tax_like(texts: &[String]) -> bool {
    texts
        .iter()
        .any(|t| t.contains(TAX_VAT) || t.contains(TAX_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(shape: RowShape, origin: Origin, texts: &[&str]) -> RowFacts {
        RowFacts {
            shape,
            origin,
            texts: texts.iter().map(|t| t.to_string()).collect(),
            classes: Vec::new(),
            header: false,
            heading: false,
        }
    }

    fn tax_header() -> RowFacts {
        row(
            RowShape::Quad,
            Origin::Body,
            &["Tipi", "TVSH", "Vlera pa TVSH", "Vlera me TVSH"],
        )
    }

    fn tax_data() -> RowFacts {
        row(RowShape::Quad, Origin::Body, &["A", "0", "1,908.34", "2,290"])
    }

    fn run(rows: &[RowFacts]) -> (Vec<Strategy>, RenderState) {
        let config = RenderConfig::default();
        let tracker = SectionTracker::new(&config);
        let mut state = RenderState::new(800.0);
        let strategies = rows.iter().map(|r| tracker.plan(r, &mut state).strategy).collect();
        (strategies, state)
    }

    fn count(strategies: &[Strategy], wanted: Strategy) -> usize {
        strategies.iter().filter(|s| **s == wanted).count()
    }

    #[test]
    fn duplicated_tax_table_renders_once() {
        let totali = row(RowShape::Pair, Origin::Body, &["Totali", "2,290"]);
        let note = row(
            RowShape::Single,
            Origin::Body,
            &["Vlera (Blerje/Shitje/Cmim i veçantë/LIBR/ Zbritje/Anulim)"],
        );
        let (strategies, state) = run(&[
            totali,
            note,
            tax_header(),
            tax_data(),
            tax_header(),
            tax_data(),
        ]);
        assert_eq!(
            strategies,
            vec![
                Strategy::LabelValue,
                Strategy::FullWidth,
                Strategy::TaxGridHeader,
                Strategy::TaxGridData,
                Strategy::Dropped,
                Strategy::Dropped,
            ]
        );
        assert_eq!(state.last_section, Section::TaxTableComplete);
        assert_eq!(state.last_section.name(), "tax_table_complete");
    }

    #[test]
    fn repeats_with_intervening_rows_are_dropped() {
        let mut rows = vec![tax_header(), tax_data()];
        for _ in 0..3 {
            rows.push(row(RowShape::Single, Origin::Foot, &["NIVF: abc"]));
            rows.push(tax_header());
            rows.push(tax_data());
        }
        let (strategies, state) = run(&rows);
        assert_eq!(count(&strategies, Strategy::TaxGridHeader), 1);
        assert_eq!(count(&strategies, Strategy::TaxGridData), 1);
        assert_eq!(count(&strategies, Strategy::Dropped), 6);
        assert_eq!(count(&strategies, Strategy::FullWidth), 3);
        assert!(state.tax_grid_done);
    }

    #[test]
    fn consecutive_headers_collapse() {
        let (strategies, _) = run(&[tax_header(), tax_header(), tax_data()]);
        assert_eq!(
            strategies,
            vec![Strategy::TaxGridHeader, Strategy::Dropped, Strategy::TaxGridData]
        );
    }

    #[test]
    fn swallow_only_covers_the_next_row() {
        let item = row(RowShape::Quad, Origin::Body, &["Kafe", "1 x", "80", "80"]);
        let (strategies, _) = run(&[
            tax_header(),
            tax_data(),
            tax_header(),
            row(RowShape::Single, Origin::Body, &["Faleminderit"]),
            item,
        ]);
        assert_eq!(strategies[3], Strategy::FullWidth);
        assert_eq!(strategies[4], Strategy::ItemRow);
    }

    #[test]
    fn grid_stays_done_after_section_changes() {
        let mut footer = row(RowShape::Single, Origin::Foot, &["Gjeneruar nga Parid"]);
        footer.classes = vec!["tds-footer".to_string()];
        let (strategies, state) = run(&[tax_header(), tax_data(), footer, tax_header(), tax_data()]);
        assert_eq!(&strategies[3..], &[Strategy::Dropped, Strategy::Dropped]);
        assert_eq!(state.last_section, Section::CompanyHeader);
    }

    #[test]
    fn header_info_and_labeled_lines() {
        let config = RenderConfig::default();
        let tracker = SectionTracker::new(&config);
        let mut state = RenderState::new(800.0);

        let mut company = row(RowShape::Single, Origin::Body, &["Rr. Azizaj"]);
        company.classes = vec!["tds-footer".to_string()];
        let mut date = row(RowShape::Single, Origin::Bare, &["Data: Mon, 20 Oct 2025"]);
        date.classes = vec!["columnsSkontrino".to_string()];
        let mut operator = row(RowShape::Single, Origin::Bare, &["Operator: IAJ"]);
        operator.classes = date.classes.clone();
        let table = row(RowShape::Single, Origin::Bare, &["Tavolina: Z3"]);

        let plan = tracker.plan(&company, &mut state);
        assert!(!plan.rule_before);
        assert_eq!(state.last_section, Section::CompanyHeader);

        let plan = tracker.plan(&date, &mut state);
        assert!(plan.rule_before);
        assert_eq!(state.last_section, Section::ReceiptInfo);

        let plan = tracker.plan(&operator, &mut state);
        assert!(!plan.rule_before, "info rule is drawn once");

        let plan = tracker.plan(&table, &mut state);
        assert!(plan.rule_after);
        assert_eq!(state.last_section, Section::AfterLabeledLine);
    }

    #[test]
    fn totals_item_header_and_footer_rules() {
        let config = RenderConfig::default();
        let tracker = SectionTracker::new(&config);
        let mut state = RenderState::new(800.0);

        let mut header = row(RowShape::Quad, Origin::Head, &["Artikull", "Sasia", "Cmimi", "Vlera"]);
        header.header = true;
        let plan = tracker.plan(&header, &mut state);
        assert_eq!(plan.strategy, Strategy::ItemHeader);
        assert!(plan.rule_before && plan.rule_after);
        assert_eq!(state.last_section, Section::TableHeader);

        let mut totali = row(RowShape::Pair, Origin::Body, &["TOTALI", "2,290"]);
        totali.heading = true;
        let plan = tracker.plan(&totali, &mut state);
        assert!(plan.rule_before);
        assert_eq!(state.last_section, Section::Totali);

        let payment = row(RowShape::Pair, Origin::Bare, &["Menyra e Pageses:", "KESH"]);
        assert!(tracker.plan(&payment, &mut state).rule_after);

        let attribution = row(RowShape::Single, Origin::Foot, &["Gjeneruar nga Parid"]);
        assert!(tracker.plan(&attribution, &mut state).rule_before);
        assert_eq!(state.last_section, Section::FooterLineAdded);
        assert!(!tracker.plan(&attribution, &mut state).rule_before);
    }

    #[test]
    fn every_shape_gets_a_strategy() {
        let (strategies, state) = run(&[
            row(RowShape::Blank, Origin::Body, &[]),
            row(RowShape::Placeholder, Origin::Foot, &[]),
            row(RowShape::OrderTicket, Origin::Body, &["2 x", "Pizza"]),
            row(RowShape::Other, Origin::Body, &["a", "b", "c"]),
        ]);
        assert_eq!(
            strategies,
            vec![
                Strategy::Blank,
                Strategy::Qr,
                Strategy::OrderTicket,
                Strategy::Fallback
            ]
        );
        assert_eq!(state.last_section, Section::None);
    }
}
