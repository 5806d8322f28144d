//! Chooses between the provider's linear text and geometry-reconstructed rows.

use crate::config::SourceMode;
use crate::tokens::re;

pub const DEFAULT_AUTO_MARGIN: f64 = 5.0;

const MONEY_WEIGHT: f64 = 6.0;
const BARCODE_WEIGHT: f64 = 4.0;
const SKU_WEIGHT: f64 = 2.0;
const TOTALS_WEIGHT: f64 = 8.0;
const LINE_WEIGHT: f64 = 0.5;
const LINE_CAP: usize = 120;
const URL_PENALTY: f64 = 10.0;

re!(re_money, r"\$?\d+\.\d{2}\b");
re!(re_barcode, r"\b\d{11,14}\b");
re!(re_sku, r"\b\d{5,8}\b");
re!(re_totals, r"(?i)\b(?:subtotal|total|tax|change\s+due)\b");
re!(re_url, r"(?i)https?://|www\.");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    Geometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceChoice {
    pub kind: SourceKind,
    pub text: String,
    pub text_score: f64,
    pub geometry_score: Option<f64>,
}

/// How receipt-like a block of text looks.
pub fn score_text(text: &str) -> f64 {
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count().min(LINE_CAP);
    MONEY_WEIGHT * re_money().find_iter(text).count() as f64
        + BARCODE_WEIGHT * re_barcode().find_iter(text).count() as f64
        + SKU_WEIGHT * re_sku().find_iter(text).count() as f64
        + TOTALS_WEIGHT * re_totals().find_iter(text).count() as f64
        + LINE_WEIGHT * lines as f64
        - URL_PENALTY * re_url().find_iter(text).count() as f64
}

pub fn select_source(linear: &str, geometry: Option<&str>, mode: SourceMode, margin: f64) -> SourceChoice {
    let text_score = score_text(linear);
    let geometry = geometry.filter(|g| !g.trim().is_empty());
    let geometry_score = geometry.map(score_text);

    let use_geometry = match (mode, geometry_score) {
        (SourceMode::Geo, Some(_)) => true,
        (SourceMode::Auto, Some(g)) => g > text_score + margin,
        _ => false,
    };

    match geometry {
        Some(g) if use_geometry => SourceChoice {
            kind: SourceKind::Geometry,
            text: g.to_string(),
            text_score,
            geometry_score,
        },
        _ => SourceChoice {
            kind: SourceKind::Text,
            text: linear.to_string(),
            text_score,
            geometry_score,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_weights() {
        assert_eq!(score_text(""), 0.0);
        // one line, one money token
        assert_eq!(score_text("MILK 3.49"), 6.5);
        // barcode (4) + line
        assert_eq!(score_text("007874235186"), 4.5);
        // sku (2) + line
        assert_eq!(score_text("1207907"), 2.5);
        // totals keyword (8) + money (6) + line
        assert_eq!(score_text("TOTAL 9.99"), 14.5);
        // url penalty
        assert_eq!(score_text("www.example.com"), -9.5);
    }

    #[test]
    fn line_bonus_is_capped() {
        let many = "x\n".repeat(500);
        assert_eq!(score_text(&many), 60.0);
    }

    #[test]
    fn auto_needs_a_clear_margin() {
        let linear = "MILK 3.49";
        let almost = "MILK 3.49\nBREAD"; // +0.5 only
        let better = "MILK 3.49\nBREAD 2.99";
        assert_eq!(select_source(linear, Some(almost), SourceMode::Auto, 5.0).kind, SourceKind::Text);
        let choice = select_source(linear, Some(better), SourceMode::Auto, 5.0);
        assert_eq!(choice.kind, SourceKind::Geometry);
        assert_eq!(choice.text, better);
    }

    #[test]
    fn explicit_modes() {
        assert_eq!(select_source("TOTAL 9.99", Some("x"), SourceMode::Geo, 5.0).kind, SourceKind::Geometry);
        assert_eq!(select_source("x", Some("TOTAL 9.99"), SourceMode::Text, 5.0).kind, SourceKind::Text);
    }

    #[test]
    fn geo_mode_without_geometry_falls_back() {
        let c = select_source("MILK 3.49", None, SourceMode::Geo, 5.0);
        assert_eq!(c.kind, SourceKind::Text);
        assert_eq!(c.geometry_score, None);
        let c = select_source("MILK 3.49", Some("  "), SourceMode::Geo, 5.0);
        assert_eq!(c.kind, SourceKind::Text);
    }
}
