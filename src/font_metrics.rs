//! Font metrics for accurate text measurement.
//!
//! Receipts are set in the two built-in PDF faces Helvetica and
//! Helvetica-Bold. Widths are in 1/1000 of the em square (standard AFM units),
//! so measuring is a pure function of text, face and size.

/// Advance widths for a single face.
#[derive(Debug)]
pub struct FontMetrics {
    /// Widths for the printable ASCII range `' '..='~'`.
    ascii: [u16; 95],
    /// Widths for the Latin-1 letters that show up on Albanian receipts.
    latin: &'static [(char, u16)],
    /// Width for characters not covered by either table.
    default_width: u16,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl FontMetrics {
    /// Width of a character in em units (1/1000)
    pub fn char_width(&self, c: char) -> u16 {
        let code = c as u32;
        if (0x20..=0x7e).contains(&code) {
            return self.ascii[(code - 0x20) as usize];
        }
        self.latin
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, w)| *w)
            .unwrap_or(self.default_width)
    }

    /// Width of a string in points
    pub fn string_width(&self, text: &str, font_size: f32) -> f32 {
        let total_units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        (total_units as f32 / self.units_per_em as f32) * font_size
    }
}

// ============================================================================
// HELVETICA
// ============================================================================

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

const HELVETICA_LATIN: &[(char, u16)] = &[
    ('ë', 556), ('é', 556), ('è', 556), ('ê', 556),
    ('Ë', 667), ('É', 667), ('È', 667),
    ('ç', 500), ('Ç', 722),
    ('à', 556), ('á', 556), ('ä', 556), ('ö', 556), ('ü', 556),
    ('–', 556), ('—', 1000), ('…', 1000), ('€', 556),
    ('°', 400), ('×', 584),
];

// ============================================================================
// HELVETICA BOLD
// ============================================================================

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const HELVETICA_BOLD_LATIN: &[(char, u16)] = &[
    ('ë', 556), ('é', 556), ('è', 556), ('ê', 556),
    ('Ë', 667), ('É', 667), ('È', 667),
    ('ç', 556), ('Ç', 722),
    ('à', 556), ('á', 556), ('ä', 556), ('ö', 611), ('ü', 611),
    ('–', 556), ('—', 1000), ('…', 1000), ('€', 556),
    ('°', 400), ('×', 584),
];

pub static HELVETICA: FontMetrics = FontMetrics {
    ascii: HELVETICA_ASCII,
    latin: HELVETICA_LATIN,
    default_width: 556,
    units_per_em: 1000,
    ascender: 718,
    descender: -207,
};

pub static HELVETICA_BOLD: FontMetrics = FontMetrics {
    ascii: HELVETICA_BOLD_ASCII,
    latin: HELVETICA_BOLD_LATIN,
    default_width: 556,
    units_per_em: 1000,
    ascender: 718,
    descender: -207,
};

/// Metrics for the regular or bold face
pub fn get_metrics(bold: bool) -> &'static FontMetrics {
    if bold {
        &HELVETICA_BOLD
    } else {
        &HELVETICA
    }
}

/// Width of `text` in points for the given face and size.
pub fn text_width(text: &str, bold: bool, font_size: f32) -> f32 {
    get_metrics(bold).string_width(text, font_size)
}
