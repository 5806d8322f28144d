//! Structural completeness score and the review gate.

use crate::types::{ParsedLineItem, ReceiptSummary};

/// Fewer extracted lines than this always go to review.
pub const MIN_LINES_FOR_AUTO_ACCEPT: usize = 3;

/// The observable signals the score is built from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub vendor_resolved: bool,
    pub date_found: bool,
    pub total_found: bool,
    pub line_count: usize,
    pub priced_line_count: usize,
}

impl Signals {
    pub fn from_result(summary: &ReceiptSummary, lines: &[ParsedLineItem]) -> Self {
        Self {
            vendor_resolved: summary.vendor.is_some(),
            date_found: summary.purchase_date.is_some(),
            total_found: summary.total.is_some(),
            line_count: lines.len(),
            priced_line_count: lines.iter().filter(|l| l.is_priced()).count(),
        }
    }

    /// Score in `[0, 1]`. Never decreases when a flag is set or a priced line
    /// is added.
    pub fn score(&self) -> f32 {
        let mut s = 0.0f32;
        if self.vendor_resolved {
            s += 0.20;
        }
        if self.date_found {
            s += 0.20;
        }
        if self.total_found {
            s += 0.25;
        }
        if self.line_count > 0 {
            let n = self.line_count as f32;
            s += (n / 40.0).min(0.20);
            s += (self.priced_line_count as f32 / n * 0.25).min(0.15);
        }
        s.clamp(0.0, 1.0)
    }

    pub fn needs_review(&self, score: f32, min_confidence: f32) -> bool {
        score < min_confidence || self.line_count < MIN_LINES_FOR_AUTO_ACCEPT || !self.total_found
    }
}

/// `(confidence, needs_review)` for a finished extraction.
pub fn assess(summary: &ReceiptSummary, lines: &[ParsedLineItem], min_confidence: f32) -> (f32, bool) {
    let signals = Signals::from_result(summary, lines);
    let score = signals.score();
    (score, signals.needs_review(score, min_confidence))
}
