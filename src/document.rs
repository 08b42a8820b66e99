//! Markup parsing and the document walker.
//!
//! The markup is parsed with an HTML5 tree builder and copied into a small
//! owned tree of [`Element`]s. The walker then yields, in document order,
//! every table and every loose block, and for each table a lazy sequence of
//! [`Row`]s tagged with the group they came from.

use kuchiki::traits::TendrilSink;
use kuchiki::{NodeData, NodeRef};
use log::debug;

use crate::error::RenderError;

/// Elements that open a new vertical block outside tables.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "section", "article", "header",
    "footer", "center", "pre", "blockquote", "address", "figcaption",
];

/// Elements whose content never reaches the page.
const DROPPED_TAGS: &[&str] = &["script", "template", "noscript", "title", "meta", "link"];

/// Elements whose content the tree builder reads as plain text.
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "title", "xmp", "noscript"];

/// Classes the producer uses for purely decorative dashed rules.
const RULE_CLASSES: &[&str] = &["div_line", "dashed-line"];

// ============================================================================
// DOCUMENT NODES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    /// Raw inline `style` attribute
    pub style: Option<String>,
    pub colspan: Option<u32>,
    pub src: Option<String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Element {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Direct child elements
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First descendant (depth-first, excluding self) matching `pred`.
    pub fn find<P>(&self, pred: &P) -> Option<&Element>
    where
        P: Fn(&Element) -> bool,
    {
        for child in self.elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find(pred) {
                return Some(found);
            }
        }
        None
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.find(&|el: &Element| el.is(tag)).is_some()
    }

    /// The element itself or a descendant is one of `tags`.
    pub fn holds_any(&self, tags: &[&str]) -> bool {
        tags.contains(&self.tag.as_str())
            || self
                .find(&|el: &Element| tags.contains(&el.tag.as_str()))
                .is_some()
    }

    /// All descendant text with whitespace runs collapsed and the ends trimmed.
    /// `<br>` counts as a space.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        self.collect_text(&mut raw);
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) if el.is("br") => out.push(' '),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Text split at every `<br>`, each piece collapsed. Blank pieces are
    /// skipped.
    pub fn text_segments(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        self.collect_lines(&mut lines, &mut current);
        push_collapsed(&mut lines, &current);
        lines
    }

    fn collect_lines(&self, lines: &mut Vec<String>, current: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => current.push_str(text),
                Node::Element(el) if el.is("br") => {
                    push_collapsed(lines, current);
                    current.clear();
                }
                Node::Element(el) => el.collect_lines(lines, current),
            }
        }
    }

    /// A decorative rule (`<hr>` or a dashed-line div) with no text.
    pub fn is_rule_marker(&self) -> bool {
        let is_rule = |el: &Element| {
            el.is("hr") || (el.is("div") && RULE_CLASSES.iter().any(|c| el.has_class(c)))
        };
        (is_rule(self) || self.find(&is_rule).is_some()) && self.text().is_empty()
    }

    /// Holds a vector-graphic placeholder standing in for the fiscal QR code.
    pub fn has_code_placeholder(&self) -> bool {
        let is_placeholder = |el: &Element| {
            el.is("svg")
                || (el.is("img")
                    && (el.src.as_deref().is_some_and(|s| s.to_ascii_lowercase().contains("qr"))
                        || el.classes.iter().any(|c| c.to_ascii_lowercase().contains("qr"))))
        };
        is_placeholder(self) || self.find(&is_placeholder).is_some()
    }
}

fn push_collapsed(lines: &mut Vec<String>, raw: &str) {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        lines.push(collapsed);
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// A parsed receipt: the element tree plus the text of every `<style>` block.
#[derive(Debug, Clone)]
pub struct Document {
    pub root: Element,
    pub style_text: String,
}

impl Document {
    pub fn parse(markup: &str) -> Result<Document, RenderError> {
        if markup.trim().is_empty() {
            return Err(RenderError::Markup("markup is empty".to_string()));
        }

        let tags = tag_source(markup);
        let opened = open_tag_positions(&tags, "<table").len();
        let closed = tags.matches("</table").count();
        if opened > closed {
            return Err(RenderError::Markup(format!(
                "unterminated <table>: {} opened, {} closed",
                opened, closed
            )));
        }

        let parsed = kuchiki::parse_html().one(markup);
        let mut builder = TreeBuilder {
            style_text: String::new(),
            explicit_tbody: explicit_tbody_flags(&tags),
            tables_seen: 0,
        };
        let mut root = Element::new("#document");
        root.children = builder.children(&parsed);

        let document = Document {
            root,
            style_text: builder.style_text,
        };
        if document.segments().is_empty() {
            return Err(RenderError::Markup(
                "markup contains no tables or text blocks".to_string(),
            ));
        }
        Ok(document)
    }
}

/// Lowered markup with comments and the bodies of raw-text elements
/// removed, so tag scans only see tags the tree builder will see.
fn tag_source(markup: &str) -> String {
    let lowered = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut rest = lowered.as_str();

    while let Some(lt) = rest.find('<') {
        out.push_str(&rest[..lt]);
        rest = &rest[lt..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            let end = comment.find("-->").map_or(comment.len(), |i| i + 3);
            rest = &comment[end..];
            continue;
        }
        if let Some(tag) = RAW_TEXT_TAGS.iter().find(|tag| opens_tag(rest, tag)) {
            let close = format!("</{}", tag);
            let end = rest.find(&close).unwrap_or(rest.len());
            out.push(' ');
            rest = &rest[end..];
            rest = rest.find('>').map_or("", move |gt| &rest[gt + 1..]);
            continue;
        }
        out.push('<');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

/// `text` starts with the opening tag `<name`.
fn opens_tag(text: &str, name: &str) -> bool {
    text.strip_prefix('<')
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|after| ends_tag_name(after.chars().next()))
}

fn ends_tag_name(next: Option<char>) -> bool {
    matches!(
        next,
        Some('>') | Some(' ') | Some('\t') | Some('\n') | Some('\r') | Some('/')
    )
}

/// Byte offsets of every `open` tag (e.g. `<table`) in lowered markup.
fn open_tag_positions(lowered: &str, open: &str) -> Vec<usize> {
    lowered
        .match_indices(open)
        .map(|(i, _)| i)
        .filter(|&i| ends_tag_name(lowered[i + open.len()..].chars().next()))
        .collect()
}

/// For every `<table` in source order, whether its own markup spells out a
/// `<tbody`. The tree builder inserts `tbody` on its own; those implied groups
/// are unwrapped so bare rows keep their "no group" origin.
fn explicit_tbody_flags(lowered: &str) -> Vec<bool> {
    let starts = open_tag_positions(lowered, "<table");
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(lowered.len());
            lowered[start..end].contains("<tbody")
        })
        .collect()
}

struct TreeBuilder {
    style_text: String,
    explicit_tbody: Vec<bool>,
    tables_seen: usize,
}

impl TreeBuilder {
    fn children(&mut self, node: &NodeRef) -> Vec<Node> {
        let mut out = Vec::new();
        for child in node.children() {
            self.convert(&child, &mut out);
        }
        out
    }

    fn convert(&mut self, node: &NodeRef, out: &mut Vec<Node>) {
        match node.data() {
            NodeData::Text(text) => out.push(Node::Text(text.borrow().clone())),
            NodeData::Element(data) => {
                let tag = data.name.local.as_ref().to_ascii_lowercase();
                if tag == "style" {
                    self.style_text.push_str(&node.text_contents());
                    self.style_text.push('\n');
                    return;
                }
                if DROPPED_TAGS.contains(&tag.as_str()) {
                    return;
                }

                let table_index = if tag == "table" {
                    self.tables_seen += 1;
                    Some(self.tables_seen - 1)
                } else {
                    None
                };

                let mut element = Element::new(&tag);
                {
                    let attrs = data.attributes.borrow();
                    element.classes = attrs
                        .get("class")
                        .map(|c| c.split_whitespace().map(str::to_string).collect())
                        .unwrap_or_default();
                    element.style = attrs.get("style").map(str::to_string);
                    element.colspan = attrs.get("colspan").and_then(|c| c.trim().parse().ok());
                    element.src = attrs.get("src").map(str::to_string);
                }
                element.children = self.children(node);

                if let Some(index) = table_index {
                    if !self.explicit_tbody.get(index).copied().unwrap_or(true) {
                        unwrap_implied_tbody(&mut element);
                    }
                }
                out.push(Node::Element(element));
            }
            NodeData::Document(_) | NodeData::DocumentFragment => {
                out.extend(self.children(node));
            }
            _ => {}
        }
    }
}

fn unwrap_implied_tbody(table: &mut Element) {
    let children = std::mem::take(&mut table.children);
    for child in children {
        match child {
            Node::Element(el) if el.is("tbody") => table.children.extend(el.children),
            other => table.children.push(other),
        }
    }
}

// ============================================================================
// WALKER
// ============================================================================

/// Structural group a row was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Head,
    Body,
    Foot,
    /// Directly under `<table>`, or a loose block outside any table.
    Bare,
}

impl Origin {
    fn of_group(tag: &str) -> Option<Origin> {
        match tag {
            "thead" => Some(Origin::Head),
            "tbody" => Some(Origin::Body),
            "tfoot" => Some(Origin::Foot),
            _ => None,
        }
    }
}

/// A top-level vertical unit of the receipt.
#[derive(Debug, Clone)]
pub enum Segment<'a> {
    Table(&'a Element),
    Block {
        element: &'a Element,
        lineage: Vec<&'a Element>,
    },
}

impl<'a> Segment<'a> {
    pub fn rows(&self) -> Rows<'a> {
        match self {
            Segment::Table(table) => Rows::of_table(*table),
            Segment::Block { element, lineage } => {
                let context_classes = lineage
                    .first()
                    .map(|parent| parent.classes.clone())
                    .unwrap_or_default();
                Rows::single(Row {
                    origin: Origin::Bare,
                    cells: vec![Cell::new(*element, lineage.clone())],
                    context_classes,
                    table: None,
                })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell<'a> {
    pub element: &'a Element,
    /// Parent and grandparent, nearest first, stopping at the table.
    pub lineage: Vec<&'a Element>,
    pub header: bool,
    /// Collapsed text content
    pub text: String,
}

impl<'a> Cell<'a> {
    fn new(element: &'a Element, lineage: Vec<&'a Element>) -> Self {
        Cell {
            header: element.is("th"),
            text: element.text(),
            element,
            lineage,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Row<'a> {
    pub origin: Origin,
    pub cells: Vec<Cell<'a>>,
    /// Classes of the row element, or of the wrapper around a loose block.
    pub context_classes: Vec<String>,
    /// Enclosing table, absent for loose blocks.
    pub table: Option<&'a Element>,
}

impl<'a> Row<'a> {
    /// No text anywhere and at least one cell is a decorative rule.
    pub fn is_separator(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
            && self.cells.iter().any(|cell| cell.element.is_rule_marker())
            && !self.cells.iter().any(|cell| cell.element.has_code_placeholder())
    }
}

struct Frame<'a> {
    children: std::slice::Iter<'a, Node>,
    origin: Origin,
    group: Option<&'a Element>,
}

/// Lazy, ordered rows of one table. Separator rows are elided.
pub struct Rows<'a> {
    table: Option<&'a Element>,
    stack: Vec<Frame<'a>>,
    pending: Option<Row<'a>>,
}

impl<'a> Rows<'a> {
    fn of_table(table: &'a Element) -> Self {
        Rows {
            table: Some(table),
            stack: vec![Frame {
                children: table.children.iter(),
                origin: Origin::Bare,
                group: None,
            }],
            pending: None,
        }
    }

    fn single(row: Row<'a>) -> Self {
        Rows {
            table: None,
            stack: Vec::new(),
            pending: Some(row),
        }
    }

    fn build_row(&self, tr: &'a Element, origin: Origin, group: Option<&'a Element>) -> Row<'a> {
        let cells = tr
            .elements()
            .filter(|el| el.is("td") || el.is("th"))
            .map(|el| {
                let mut lineage = vec![tr];
                lineage.extend(group);
                Cell::new(el, lineage)
            })
            .collect();
        Row {
            origin,
            cells,
            context_classes: tr.classes.clone(),
            table: self.table,
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Row<'a>> {
        if let Some(row) = self.pending.take() {
            return Some(row);
        }
        loop {
            let frame = self.stack.last_mut()?;
            let origin = frame.origin;
            let group = frame.group;
            let next = match frame.children.next() {
                Some(node) => node,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            let el = match next {
                Node::Element(el) => el,
                Node::Text(_) => continue,
            };

            if el.is("tr") {
                let row = self.build_row(el, origin, group);
                if row.cells.is_empty() {
                    continue;
                }
                if row.is_separator() {
                    debug!("Eliding separator row");
                    continue;
                }
                return Some(row);
            }
            if el.is("table") {
                // A table outside any row carries no rows of this table.
                continue;
            }
            let (origin, group) = match Origin::of_group(&el.tag) {
                Some(group_origin) => (group_origin, Some(el)),
                None => (origin, group),
            };
            self.stack.push(Frame {
                children: el.children.iter(),
                origin,
                group,
            });
        }
    }
}

impl Document {
    /// Tables and loose blocks in document order.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut out = Vec::new();
        collect_segments(&self.root, &mut Vec::new(), &mut out);
        out
    }

    /// Top-level tables in document order. A table nested in a cell is part
    /// of that cell's text.
    pub fn tables(&self) -> Vec<&Element> {
        self.segments()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Table(table) => Some(table),
                Segment::Block { .. } => None,
            })
            .collect()
    }
}

fn collect_segments<'a>(
    parent: &'a Element,
    ancestors: &mut Vec<&'a Element>,
    out: &mut Vec<Segment<'a>>,
) {
    ancestors.push(parent);
    for el in parent.elements() {
        if el.is("table") {
            out.push(Segment::Table(el));
            continue;
        }
        if el.is("hr") || el.is_rule_marker() {
            continue;
        }
        if BLOCK_TAGS.contains(&el.tag.as_str()) && !has_block_descendant(el) {
            if !el.text().is_empty() {
                let lineage = ancestors.iter().rev().take(2).copied().collect();
                out.push(Segment::Block { element: el, lineage });
            }
            continue;
        }
        collect_segments(el, ancestors, out);
    }
    ancestors.pop();
}

fn has_block_descendant(el: &Element) -> bool {
    el.find(&|child: &Element| {
        BLOCK_TAGS.contains(&child.tag.as_str())
            || matches!(child.tag.as_str(), "table" | "hr" | "ul" | "ol")
    })
    .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_of(doc: &Document, table: usize) -> Vec<(Origin, Vec<String>)> {
        let tables = doc.tables();
        Segment::Table(tables[table])
            .rows()
            .map(|row| (row.origin, row.cells.iter().map(|c| c.text.clone()).collect()))
            .collect()
    }

    #[test]
    fn rows_keep_their_group_origin() {
        let doc = Document::parse(
            "<table>
               <thead><tr><th>Artikull</th><th>Sasia</th></tr></thead>
               <tbody><tr><td>Kafe</td><td>1 x</td></tr></tbody>
               <tfoot><tr><td>NIVF: abc</td></tr></tfoot>
             </table>",
        )
        .unwrap();
        let rows = rows_of(&doc, 0);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0, Origin::Head);
        assert_eq!(rows[1], (Origin::Body, vec!["Kafe".to_string(), "1 x".to_string()]));
        assert_eq!(rows[2].0, Origin::Foot);
    }

    #[test]
    fn implied_tbody_is_unwrapped() {
        let doc = Document::parse("<table><tr><td>Totali</td><td>2,290</td></tr></table>").unwrap();
        let rows = rows_of(&doc, 0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, Origin::Bare);
    }

    #[test]
    fn separator_rows_are_elided() {
        let doc = Document::parse(
            "<table>
               <tr><td>Kafe</td></tr>
               <tr><td><hr></td></tr>
               <tr><td colspan=\"2\"><div class=\"dashed-line\"></div></td></tr>
               <tr><td>Uje</td></tr>
             </table>",
        )
        .unwrap();
        let texts: Vec<_> = rows_of(&doc, 0).into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec![vec!["Kafe".to_string()], vec!["Uje".to_string()]]);
    }

    #[test]
    fn rules_beside_text_keep_the_row() {
        let doc = Document::parse(
            "<table>
               <tr><td>Totali</td><td>2,290</td><td><hr></td></tr>
               <tr><td><hr></td><td></td></tr>
             </table>",
        )
        .unwrap();
        let texts: Vec<_> = rows_of(&doc, 0).into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0][..2], ["Totali".to_string(), "2,290".to_string()]);
    }

    #[test]
    fn style_blocks_are_collected_not_rendered() {
        let doc = Document::parse(
            "<html><head><style>.title1 { font-size: 18px; }</style></head>
             <body><table><tr><td class=\"title1\">Fature</td></tr></table></body></html>",
        )
        .unwrap();
        assert!(doc.style_text.contains(".title1"));
        let rows = rows_of(&doc, 0);
        assert_eq!(rows[0].1, vec!["Fature".to_string()]);
    }

    #[test]
    fn cells_record_header_flag_and_lineage() {
        let doc = Document::parse(
            "<table><thead><tr class=\"hdr\"><th>A</th><td>B</td></tr></thead></table>",
        )
        .unwrap();
        let tables = doc.tables();
        let row = Segment::Table(tables[0]).rows().next().unwrap();
        assert!(row.cells[0].header);
        assert!(!row.cells[1].header);
        let lineage: Vec<&str> = row.cells[0].lineage.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(lineage, vec!["tr", "thead"]);
        assert_eq!(row.context_classes, vec!["hdr".to_string()]);
    }

    #[test]
    fn loose_blocks_are_walked_in_order() {
        let doc = Document::parse(
            "<table><tr><td>Header</td></tr></table>
             <div class=\"columnsSkontrino\"><div>Data: 20 Oct</div><div>Tavolina: Z3</div></div>
             <hr>
             <table><tr><td>Kafe</td></tr></table>",
        )
        .unwrap();
        let segments = doc.segments();
        assert_eq!(segments.len(), 4);
        assert!(matches!(segments[0], Segment::Table(_)));
        let row = segments[1].rows().next().unwrap();
        assert_eq!(row.origin, Origin::Bare);
        assert_eq!(row.cells[0].text, "Data: 20 Oct");
        assert_eq!(row.context_classes, vec!["columnsSkontrino".to_string()]);
        assert!(matches!(segments[3], Segment::Table(_)));
    }

    #[test]
    fn text_collapses_whitespace_and_splits_on_br() {
        let doc = Document::parse(
            "<table><tr><td>NSLF:<br>\n   ABC   123 </td></tr></table>",
        )
        .unwrap();
        let tables = doc.tables();
        let row = Segment::Table(tables[0]).rows().next().unwrap();
        assert_eq!(row.cells[0].text, "NSLF: ABC 123");
        assert_eq!(
            row.cells[0].element.text_segments(),
            vec!["NSLF:".to_string(), "ABC 123".to_string()]
        );
    }

    #[test]
    fn inline_markup_does_not_split_lines() {
        let doc = Document::parse(
            "<table><tr><td><b>NSLF:</b> 8C4D<br>7F0B <i>2A</i></td></tr></table>",
        )
        .unwrap();
        let tables = doc.tables();
        let row = Segment::Table(tables[0]).rows().next().unwrap();
        assert_eq!(
            row.cells[0].element.text_segments(),
            vec!["NSLF: 8C4D".to_string(), "7F0B 2A".to_string()]
        );
    }

    #[test]
    fn code_placeholders() {
        let doc = Document::parse(
            "<table><tr><td><svg width=\"10\"></svg></td></tr>
                    <tr><td><img src=\"qr_placeholder\"></td></tr>
                    <tr><td><img src=\"logo.png\"></td></tr></table>",
        )
        .unwrap();
        let tables = doc.tables();
        let flags: Vec<bool> = Segment::Table(tables[0])
            .rows()
            .map(|row| row.cells[0].element.has_code_placeholder())
            .collect();
        assert_eq!(flags, vec![true, true, false]);
    }

    #[test]
    fn catastrophic_markup_is_rejected() {
        assert!(matches!(Document::parse("   "), Err(RenderError::Markup(_))));
        assert!(matches!(
            Document::parse("<table><tr><td>Kafe</td></tr>"),
            Err(RenderError::Markup(_))
        ));
        assert!(matches!(
            Document::parse("<html><body><img src=\"x.png\"></body></html>"),
            Err(RenderError::Markup(_))
        ));
    }

    #[test]
    fn tags_in_comments_and_scripts_are_not_counted() {
        let doc = Document::parse(
            "<!-- old layout: <table> -->
             <script>var t = \"<table>\";</script>
             <table><tr><td>Kafe</td></tr></table>
             <table><tbody><tr><td>Uje</td></tr></tbody></table>",
        )
        .unwrap();
        let tables = doc.tables();
        assert_eq!(tables.len(), 2);
        assert_eq!(rows_of(&doc, 0)[0].0, Origin::Bare);
        assert_eq!(rows_of(&doc, 1)[0].0, Origin::Body);
    }

    #[test]
    fn tag_source_drops_comments_and_raw_text() {
        let tags = tag_source("<P>a<!-- <TABLE> -->b<style>x<table</style>c<table>");
        assert_eq!(tags, "<p>ab c<table>");
        assert!(opens_tag("<table class=x>", "table"));
        assert!(!opens_tag("<tablet>", "table"));
    }

    #[test]
    fn malformed_cells_are_tolerated() {
        let doc = Document::parse("<table><tr><td>Kafe<td>80</tr></table>").unwrap();
        let rows = rows_of(&doc, 0);
        assert_eq!(rows[0].1, vec!["Kafe".to_string(), "80".to_string()]);
    }
}
