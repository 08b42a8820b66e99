//! Embedded stylesheet parsing and style resolution.
//!
//! Only the subset receipt producers emit is understood: bare tag selectors
//! and single class selectors. Anything else (compound selectors, at-rules,
//! garbage) is skipped, and resolution never fails: it falls back to
//! defaults.

use log::debug;
use std::collections::HashMap;

use crate::document::Element;

/// Font weights that render bold.
const BOLD_WEIGHTS: &[&str] = &["bold", "bolder", "500", "600", "700", "800", "900"];

/// Smallest size ever drawn, after scaling.
pub const MIN_FONT_SIZE: f32 = 6.0;

// ============================================================================
// DECLARATIONS
// ============================================================================

/// Ordered `property -> raw value` pairs; re-declaring a property replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarations(Vec<(String, String)>);

impl Declarations {
    /// Parse `prop: value; prop: value` text. Pairs without a colon, name or
    /// value are dropped.
    pub fn parse(text: &str) -> Self {
        let mut decls = Declarations::default();
        decls.merge_text(text);
        decls
    }

    fn merge_text(&mut self, text: &str) {
        for part in text.split(';') {
            let Some((prop, value)) = part.split_once(':') else {
                continue;
            };
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.replace("!important", "").trim().to_string();
            if prop.is_empty() || value.is_empty() {
                continue;
            }
            self.set(prop, value);
        }
    }

    pub fn set(&mut self, prop: String, value: String) {
        match self.0.iter_mut().find(|(p, _)| *p == prop) {
            Some(slot) => slot.1 = value,
            None => self.0.push((prop, value)),
        }
    }

    pub fn get(&self, prop: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// STYLESHEET
// ============================================================================

/// Selector map built once per document. Class names are stored without the
/// leading dot.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    tags: HashMap<String, Declarations>,
    classes: HashMap<String, Declarations>,
}

impl Stylesheet {
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut sheet = Stylesheet::default();
        let mut rest = css.trim_start();

        while !rest.is_empty() {
            if rest.starts_with('@') {
                // `@import ...;` ends at the semicolon, `@media {...}` at its
                // balanced closing brace.
                let semi = rest.find(';');
                let open = rest.find('{');
                rest = match (semi, open) {
                    (Some(s), Some(o)) if s < o => &rest[s + 1..],
                    (Some(s), None) => &rest[s + 1..],
                    (_, Some(o)) => match matching_brace(rest, o) {
                        Some(close) => &rest[close + 1..],
                        None => break,
                    },
                    (None, None) => break,
                };
                rest = rest.trim_start();
                continue;
            }

            let Some(open) = rest.find('{') else {
                break;
            };
            let Some(len) = rest[open + 1..].find('}') else {
                debug!("Skipping unterminated rule {:?}", rest[..open].trim());
                break;
            };
            let body = &rest[open + 1..open + 1 + len];
            // Debris from an earlier broken rule ends at its `}` or `;`.
            let selectors = rest[..open]
                .rsplit(|c| c == '}' || c == ';')
                .next()
                .unwrap_or("")
                .trim();
            rest = rest[open + len + 2..].trim_start();

            if body.contains('{') {
                debug!("Skipping nested block under {:?}", selectors);
                continue;
            }
            for selector in selectors.split(',') {
                sheet.add_rule(selector.trim(), body);
            }
        }

        debug!(
            "Parsed stylesheet: {} tag rules, {} class rules",
            sheet.tags.len(),
            sheet.classes.len()
        );
        sheet
    }

    fn add_rule(&mut self, selector: &str, body: &str) {
        let (map, key) = match selector.strip_prefix('.') {
            Some(class) => (&mut self.classes, class.to_string()),
            None => (&mut self.tags, selector.to_ascii_lowercase()),
        };
        if !is_simple_name(&key) {
            return;
        }
        map.entry(key).or_default().merge_text(body);
    }

    /// Force `font-size` onto classes the stylesheet already defines.
    pub fn with_font_overrides(mut self, overrides: &[(String, String)]) -> Self {
        for (class, size) in overrides {
            if let Some(decls) = self.classes.get_mut(class) {
                decls.set("font-size".to_string(), size.clone());
            }
        }
        self
    }

    pub fn tag(&self, tag: &str) -> Option<&Declarations> {
        self.tags.get(tag)
    }

    pub fn class(&self, class: &str) -> Option<&Declarations> {
        self.classes.get(class)
    }

    pub fn rule_count(&self) -> usize {
        self.tags.len() + self.classes.len()
    }

    /// Effective style of `element`.
    ///
    /// Layers, lowest priority first: defaults, ancestor tag rules
    /// (`lineage` is nearest first and already stops at the table), the
    /// element's tag rule, its classes in attribute order, inline style.
    pub fn resolve(
        &self,
        element: &Element,
        lineage: &[&Element],
        default_size: u32,
    ) -> ResolvedStyle {
        let mut cascade = Cascade::default();

        for ancestor in lineage.iter().take(2).rev() {
            if let Some(decls) = self.tag(&ancestor.tag) {
                cascade.apply(decls);
            }
        }
        if let Some(decls) = self.tag(&element.tag) {
            cascade.apply(decls);
        }
        for class in &element.classes {
            if let Some(decls) = self.class(class) {
                cascade.apply(decls);
            }
        }
        if let Some(inline) = &element.style {
            cascade.apply(&Declarations::parse(inline));
            if inline.to_ascii_lowercase().contains("bold") {
                cascade.bold = Some(true);
            }
        }

        ResolvedStyle {
            font_size: cascade
                .font_size
                .as_deref()
                .and_then(parse_font_size)
                .unwrap_or(default_size),
            bold: cascade.bold.unwrap_or(false),
            align: cascade.align.unwrap_or(TextAlign::Left),
        }
    }
}

#[derive(Debug, Default)]
struct Cascade {
    font_size: Option<String>,
    bold: Option<bool>,
    align: Option<TextAlign>,
}

impl Cascade {
    fn apply(&mut self, decls: &Declarations) {
        if let Some(size) = decls.get("font-size") {
            self.font_size = Some(size.to_string());
        }
        if let Some(weight) = decls.get("font-weight") {
            self.bold = Some(BOLD_WEIGHTS.contains(&weight.to_ascii_lowercase().as_str()));
        }
        if let Some(align) = decls.get("text-align").and_then(TextAlign::parse) {
            self.align = Some(align);
        }
    }
}

// ============================================================================
// RESOLVED STYLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn parse(value: &str) -> Option<TextAlign> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" | "justify" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" | "end" => Some(TextAlign::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStyle {
    /// Unscaled size in points
    pub font_size: u32,
    pub bold: bool,
    pub align: TextAlign,
}

impl ResolvedStyle {
    /// Size after the global font scale, never below [`MIN_FONT_SIZE`].
    pub fn scaled_size(&self, font_scale: f32) -> f32 {
        scale_font_size(self.font_size as f32, font_scale)
    }
}

pub fn scale_font_size(size: f32, font_scale: f32) -> f32 {
    (size * font_scale).floor().max(MIN_FONT_SIZE)
}

// ============================================================================
// HELPERS
// ============================================================================

/// `14px`, `10.5pt`, `9` -> whole points. Other units are rejected.
pub fn parse_font_size(raw: &str) -> Option<u32> {
    let value = raw.trim().to_ascii_lowercase();
    let number = value
        .strip_suffix("px")
        .or_else(|| value.strip_suffix("pt"))
        .unwrap_or(&value)
        .trim();
    let size: f32 = number.parse().ok()?;
    if size.is_finite() && size > 0.0 {
        Some(size as u32)
    } else {
        None
    }
}

fn is_simple_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        rest = match rest[start + 2..].find("*/") {
            Some(end) => &rest[start + 2 + end + 2..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

/// Index of the `}` closing the block opened at `open`.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
