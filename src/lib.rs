//! Receipt markup to PDF for 80mm thermal paper.
//!
//! The input is the constrained HTML a point-of-sale system emits for
//! receipts, invoices and kitchen tickets; the output is a laid-out PDF.
//! No browser engine is involved: rows are classified by a small state
//! machine and drawn with fixed strategies.

pub mod config;
pub mod document;
pub mod error;
pub mod flow;
pub mod font_metrics;
pub mod layout;
pub mod pdf;
pub mod qr;
pub mod render;
pub mod section;
pub mod stylesheet;
pub mod trace;

pub use config::{RenderConfig, ServerConfig};
pub use error::RenderError;
pub use render::ReceiptRenderer;
pub use trace::Trace;
