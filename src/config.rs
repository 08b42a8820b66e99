use log::warn;
use serde::Deserialize;
use std::net::SocketAddr;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

pub const DEFAULT_FONT_SCALE: f32 = 0.8;
pub const DEFAULT_ADDR: &str = "127.0.0.1:3001";

// ============================================================================
// RENDER CONFIG
// ============================================================================

/// Tunables for one render job. All lengths are millimetres except font sizes,
/// which are points.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Global multiplier applied to every resolved font size (floored at 6pt).
    pub font_scale: f32,

    // --- Page geometry ---
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub side_margin_mm: f32,
    pub top_margin_mm: f32,
    /// Top margin used on pages opened by a page break.
    pub continuation_top_margin_mm: f32,
    pub bottom_margin_mm: f32,

    // --- Fixed-size elements ---
    pub qr_size_mm: f32,
    pub tax_grid_font_size: f32,
    pub tax_grid_row_height_mm: f32,

    // --- Section markers ---
    pub footer_class: String,
    pub info_class: String,
    pub labeled_line_markers: Vec<String>,
    pub attribution_markers: Vec<String>,
    pub code_labels: Vec<String>,

    /// Font sizes forced onto classes the stylesheet defines.
    pub class_font_overrides: Vec<(String, String)>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            font_scale: DEFAULT_FONT_SCALE,
            page_width_mm: 80.0,
            page_height_mm: 297.0,
            side_margin_mm: 3.0,
            top_margin_mm: 5.0,
            continuation_top_margin_mm: 10.0,
            bottom_margin_mm: 20.0,
            qr_size_mm: 30.0,
            tax_grid_font_size: 9.0,
            tax_grid_row_height_mm: 5.5,
            footer_class: "tds-footer".to_string(),
            info_class: "columnsSkontrino".to_string(),
            labeled_line_markers: vec![
                "Tavolina:".to_string(),
                "Menyra e Pageses:".to_string(),
                "Mënyra e Pagesës:".to_string(),
            ],
            attribution_markers: vec!["Gjeneruar".to_string(), "Generated".to_string()],
            code_labels: vec!["NIVF:".to_string(), "NSLF:".to_string()],
            class_font_overrides: vec![
                ("title1".to_string(), "14px".to_string()),
                ("title1_urdhri".to_string(), "14px".to_string()),
                ("tds-footer".to_string(), "11px".to_string()),
            ],
        }
    }
}

impl RenderConfig {
    /// Defaults, with `FONT_SCALE` taken from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = RenderConfig::default();
        if let Some(raw) = lookup("FONT_SCALE") {
            match raw.trim().parse::<f32>() {
                Ok(scale) if scale.is_finite() && scale > 0.0 => config.font_scale = scale,
                _ => warn!(
                    "Ignoring FONT_SCALE={:?}, using {}",
                    raw, DEFAULT_FONT_SCALE
                ),
            }
        }
        config
    }

    pub fn with_font_scale(mut self, font_scale: f32) -> Self {
        self.font_scale = font_scale;
        self
    }

    /// Page geometry converted to points.
    pub fn geometry(&self) -> Geometry {
        let width = self.page_width_mm * MM;
        let margin = self.side_margin_mm * MM;
        Geometry {
            page_width: width,
            page_height: self.page_height_mm * MM,
            margin,
            content_width: width - 2.0 * margin,
            top: (self.page_height_mm - self.top_margin_mm) * MM,
            continuation_top: (self.page_height_mm - self.continuation_top_margin_mm) * MM,
            bottom: self.bottom_margin_mm * MM,
        }
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Page geometry in points, PDF orientation (y grows upwards).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub content_width: f32,
    /// Cursor start on the first page.
    pub top: f32,
    /// Cursor start after a page break.
    pub continuation_top: f32,
    /// Lowest y a drawn item may reach before a break is forced.
    pub bottom: f32,
}

// ============================================================================
// SERVER CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let fallback: SocketAddr = ([127, 0, 0, 1], 3001).into();
        let addr = match lookup("RECEIPT_PDF_ADDR") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring RECEIPT_PDF_ADDR={:?}, using {}", raw, DEFAULT_ADDR);
                fallback
            }),
            None => fallback,
        };
        ServerConfig { addr }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn font_scale_from_environment() {
        let config = RenderConfig::from_lookup(lookup(&[("FONT_SCALE", "1.2")]));
        assert!((config.font_scale - 1.2).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_font_scale_keeps_default() {
        for bad in ["abc", "-1", "0", "NaN"] {
            let config = RenderConfig::from_lookup(lookup(&[("FONT_SCALE", bad)]));
            assert_eq!(config.font_scale, DEFAULT_FONT_SCALE, "value {bad}");
        }
    }

    #[test]
    fn geometry_is_80mm_wide() {
        let g = RenderConfig::default().geometry();
        assert!((g.page_width - 226.77).abs() < 0.01);
        assert!((g.content_width - 74.0 * MM).abs() < 0.01);
        assert!(g.top > g.continuation_top);
        assert!((g.bottom - 20.0 * MM).abs() < 0.01);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{"font_scale": 1.0}"#).unwrap();
        assert_eq!(config.font_scale, 1.0);
        assert_eq!(config.footer_class, "tds-footer");
        assert_eq!(config.code_labels, vec!["NIVF:", "NSLF:"]);
    }

    #[test]
    fn server_address() {
        let default = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(default.addr.to_string(), DEFAULT_ADDR);

        let custom = ServerConfig::from_lookup(lookup(&[("RECEIPT_PDF_ADDR", "0.0.0.0:8080")]));
        assert_eq!(custom.addr.port(), 8080);

        let bad = ServerConfig::from_lookup(lookup(&[("RECEIPT_PDF_ADDR", "nope")]));
        assert_eq!(bad.addr.to_string(), DEFAULT_ADDR);
    }
}
