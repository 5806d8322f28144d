//! Folds OCR rows into one logical line per purchased item.
//!
//! A single-slot pending buffer holds the one fragment still waiting for its
//! price or continuation. Every input row ends up in exactly one output line,
//! in input order.

use tracing::trace;

use crate::tokens::{has_letters, has_weight_or_rate_signal, line_total_token, re};
use crate::types::{LineKind, LogicalLine};
use crate::vendor::VendorResolution;

re!(re_terminal,
    r"(?i)\b(?:sub\s*-?\s*total|total|tax|hst|gst|pst|vat|change(?:\s+due)?|balance(?:\s+due)?|amount\s+due|tend(?:er|ered)?|cash|visa|mastercard|amex|discover|debit|credit|payment|approved|auth(?:orization)?|card\s*#|acct|items?\s+sold|number\s+of\s+items|thank\s*you|you\s+saved|total\s+savings)\b");
re!(re_store_ids, r"(?i)\b(?:st|op|te|tr|tc|trn|reg|term|store|cashier|whse|lane)\s*#");
re!(re_phone, r"\(?\d{3}\)?[\s\-.]\d{3}[\s\-.]\d{4}");
re!(re_date, r"\b\d{1,2}/\d{1,2}/\d{2,4}\b|\b\d{4}-\d{2}-\d{2}\b");
re!(re_time, r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?\s*(?:am|pm)?\b");
re!(re_member, r"(?i)^member\b");
re!(re_store_number, r"^#\s*\d+\b");
re!(re_street_address,
    r"(?i)^\d{1,6}\s+(?:[A-Za-z0-9.'\-]+\s+){1,4}(?:st|street|ave|avenue|rd|road|blvd|dr|drive|way|hwy|ln|lane|pkwy|ct|pl)\.?(?:[\s,]|$)");
re!(re_city_state_zip, r"\b[A-Z]{2},?\s+\d{5}(?:-\d{4})?$");
re!(re_leading_code, r"^\d{5,13}\b");
re!(re_leading_flag, r"^[A-Za-z]{1,2}(?:\s+\d|\s*$)");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    /// Totals, tender, cash or header boilerplate.
    Terminal,
    /// Letter-free reference followed by a negative amount.
    DiscountReference,
    /// Carries a line-total money token.
    Priced,
    /// Code, flag or weight/rate fragment that belongs to a neighbour.
    Continuation,
    NameLike,
}

pub fn is_terminal_row(line: &str) -> bool {
    re_terminal().is_match(line)
        || re_store_ids().is_match(line)
        || re_phone().is_match(line)
        || re_date().is_match(line)
        || re_time().is_match(line)
        || re_member().is_match(line)
        || is_header_noise(line)
}

/// Store number, street address or city/state/ZIP row without a price.
fn is_header_noise(line: &str) -> bool {
    (re_store_number().is_match(line) || re_street_address().is_match(line) || re_city_state_zip().is_match(line))
        && line_total_token(line).is_none()
}

pub fn classify_row(line: &str) -> RowClass {
    if is_terminal_row(line) {
        return RowClass::Terminal;
    }
    if let Some(tok) = line_total_token(line) {
        let prefix = tok.prefix(line);
        if tok.value.is_negative() && !prefix.is_empty() && !has_letters(prefix) {
            return RowClass::DiscountReference;
        }
        return RowClass::Priced;
    }
    if re_leading_code().is_match(line) || re_leading_flag().is_match(line) || has_weight_or_rate_signal(line) {
        return RowClass::Continuation;
    }
    RowClass::NameLike
}

#[derive(Debug)]
struct Pending {
    text: String,
    parts: usize,
}

impl Pending {
    fn new(text: &str) -> Self {
        Self { text: text.to_string(), parts: 1 }
    }

    fn append(&mut self, text: &str) {
        self.text.push(' ');
        self.text.push_str(text);
        self.parts += 1;
    }

    fn into_line(self) -> LogicalLine {
        let mut line = LogicalLine::item(self.text);
        line.merged = self.parts > 1;
        line
    }
}

struct Stitcher<'a> {
    /// Retailer banner rows, treated as header noise.
    is_header: &'a dyn Fn(&str) -> bool,
    emitted: Vec<LogicalLine>,
    pending: Option<Pending>,
}

impl<'a> Stitcher<'a> {
    fn new(is_header: &'a dyn Fn(&str) -> bool) -> Self {
        Self { is_header, emitted: Vec::new(), pending: None }
    }

    fn flush(&mut self) {
        if let Some(p) = self.pending.take() {
            self.emitted.push(p.into_line());
        }
    }

    fn push(mut self, line: &str) -> Self {
        let class = if (self.is_header)(line) { RowClass::Terminal } else { classify_row(line) };
        trace!(?class, line, "stitch");
        match class {
            RowClass::Terminal => {
                self.flush();
                self.emitted.push(LogicalLine::new(line, LineKind::Terminal));
            }
            RowClass::DiscountReference => {
                self.flush();
                self.emitted.push(LogicalLine::new(line, LineKind::DiscountReference));
            }
            RowClass::Priced => match self.pending.take() {
                Some(mut p) => {
                    p.append(line);
                    self.emitted.push(p.into_line());
                }
                None => self.emitted.push(LogicalLine::item(line)),
            },
            RowClass::Continuation => {
                if let Some(p) = self.pending.as_mut() {
                    p.append(line);
                } else if let Some(prev) = self.emitted.last_mut().filter(|l| l.kind == LineKind::Item) {
                    prev.text.push(' ');
                    prev.text.push_str(line);
                    prev.merged = true;
                } else {
                    self.pending = Some(Pending::new(line));
                }
            }
            RowClass::NameLike => {
                self.flush();
                self.pending = Some(Pending::new(line));
            }
        }
        self
    }

    fn finish(mut self) -> Vec<LogicalLine> {
        self.flush();
        self.emitted
    }
}

fn stitch_rows<S: AsRef<str>>(lines: &[S], is_header: &dyn Fn(&str) -> bool) -> Vec<LogicalLine> {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .fold(Stitcher::new(is_header), Stitcher::push)
        .finish()
}

/// The generic state machine, without retailer hooks.
pub fn stitch_lines<S: AsRef<str>>(lines: &[S]) -> Vec<LogicalLine> {
    stitch_rows(lines, &|_| false)
}

/// Retailer raw-line hook, the state machine, then the retailer logical-line hook.
pub fn stitch(raw_lines: Vec<String>, vendor: &VendorResolution) -> Vec<LogicalLine> {
    let raw_lines = vendor.preprocess_raw_lines(raw_lines);
    let logical = stitch_rows(&raw_lines, &|line| vendor.is_header_row(line));
    vendor.preprocess_logical_lines(logical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vendor::VendorAdapter;

    fn texts(lines: &[LogicalLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    // ── Classification ────────────────────────────────────────────────────────

    #[test]
    fn classifies_rows() {
        assert_eq!(classify_row("SUBTOTAL 12.00"), RowClass::Terminal);
        assert_eq!(classify_row("VISA TEND 12.00"), RowClass::Terminal);
        assert_eq!(classify_row("ST# 1234 OP# 00"), RowClass::Terminal);
        assert_eq!(classify_row("01/15/2024 12:34"), RowClass::Terminal);
        assert_eq!(classify_row("350276 /1207907 7.80-"), RowClass::DiscountReference);
        assert_eq!(classify_row("MILK 3.49"), RowClass::Priced);
        assert_eq!(classify_row("7.80-"), RowClass::Priced);
        assert_eq!(classify_row("1234567"), RowClass::Continuation);
        assert_eq!(classify_row("E 1234567"), RowClass::Continuation);
        assert_eq!(classify_row("3.04 lb @ 0.54"), RowClass::Continuation);
        assert_eq!(classify_row("BANANAS"), RowClass::NameLike);
        assert_eq!(classify_row("KS WATER"), RowClass::NameLike);
    }

    #[test]
    fn per_unit_price_does_not_close_a_row() {
        assert_eq!(classify_row("0.99/lb"), RowClass::Continuation);
    }

    // ── State machine ─────────────────────────────────────────────────────────

    #[test]
    fn name_then_price_merge() {
        let out = stitch_lines(&["KS WATER", "4.99 A"]);
        assert_eq!(texts(&out), vec!["KS WATER 4.99 A"]);
        assert!(out[0].merged);
    }

    #[test]
    fn priced_rows_stand_alone() {
        let out = stitch_lines(&["MILK 3.49", "BREAD 2.99"]);
        assert_eq!(texts(&out), vec!["MILK 3.49", "BREAD 2.99"]);
        assert!(out.iter().all(|l| !l.merged));
    }

    #[test]
    fn produce_fragments_accumulate_in_pending() {
        let out = stitch_lines(&["BANANAS", "3.04 lb @ 0.54", "1.64"]);
        assert_eq!(texts(&out), vec!["BANANAS 3.04 lb @ 0.54 1.64"]);
    }

    #[test]
    fn terminal_rows_flush_pending() {
        let out = stitch_lines(&["BANANAS", "TOTAL 1.64"]);
        assert_eq!(texts(&out), vec!["BANANAS", "TOTAL 1.64"]);
        assert_eq!(out[0].kind, LineKind::Item);
        assert_eq!(out[1].kind, LineKind::Terminal);
    }

    #[test]
    fn name_after_name_flushes_the_first() {
        let out = stitch_lines(&["WHOLE FOODS", "APPLES", "2.49"]);
        assert_eq!(texts(&out), vec!["WHOLE FOODS", "APPLES 2.49"]);
    }

    #[test]
    fn continuation_without_pending_joins_previous_item() {
        let out = stitch_lines(&["MILK 3.49", "1234567"]);
        assert_eq!(texts(&out), vec!["MILK 3.49 1234567"]);
        assert!(out[0].merged);
    }

    #[test]
    fn continuation_never_joins_a_terminal_row() {
        let out = stitch_lines(&["TOTAL 3.49", "1234567", "KS WATER 4.99"]);
        assert_eq!(texts(&out), vec!["TOTAL 3.49", "1234567 KS WATER 4.99"]);
    }

    #[test]
    fn store_header_rows_are_terminal() {
        let out = stitch_lines(&["#123 SEATTLE", "1234567 KS WATER 4.99 A"]);
        assert_eq!(texts(&out), vec!["#123 SEATTLE", "1234567 KS WATER 4.99 A"]);
        assert_eq!(out[0].kind, LineKind::Terminal);
        assert_eq!(out[1].kind, LineKind::Item);
    }

    #[test]
    fn address_rows_are_terminal() {
        let out = stitch_lines(&["840 MAIN ST", "SEATTLE, WA 98101", "MILK 3.49"]);
        assert_eq!(texts(&out), vec!["840 MAIN ST", "SEATTLE, WA 98101", "MILK 3.49"]);
        assert_eq!(out[0].kind, LineKind::Terminal);
        assert_eq!(out[1].kind, LineKind::Terminal);
        assert!(!out[2].merged);
    }

    #[test]
    fn name_split_across_rows_joins_its_price() {
        let out = stitch_lines(&["ORGANIC BABY", "SPINACH 4.99"]);
        assert_eq!(texts(&out), vec!["ORGANIC BABY SPINACH 4.99"]);
        assert!(out[0].merged);
    }

    #[test]
    fn retailer_banner_is_header_noise() {
        let costco = VendorResolution {
            adapter: Some(VendorAdapter::Costco),
            vendor_name: Some("Costco Wholesale".into()),
            score: 13,
        };
        let raw = vec!["COSTCO WHOLESALE".to_string(), "1234567 KS WATER 4.99 A".to_string()];
        let out = stitch(raw, &costco);
        assert_eq!(texts(&out), vec!["COSTCO WHOLESALE", "1234567 KS WATER 4.99 A"]);
        assert_eq!(out[0].kind, LineKind::Terminal);

        let out = stitch_lines(&["COSTCO WHOLESALE", "1234567 KS WATER 4.99 A"]);
        assert_eq!(texts(&out), vec!["COSTCO WHOLESALE 1234567 KS WATER 4.99 A"]);
    }

    #[test]
    fn code_row_joins_the_named_price_row() {
        let out = stitch_lines(&["1234567", "KS WATER 4.99 A"]);
        assert_eq!(texts(&out), vec!["1234567 KS WATER 4.99 A"]);
    }

    #[test]
    fn discount_reference_stands_alone() {
        let out = stitch_lines(&["KS WATER", "350276 /1207907 7.80-"]);
        assert_eq!(texts(&out), vec!["KS WATER", "350276 /1207907 7.80-"]);
        assert_eq!(out[1].kind, LineKind::DiscountReference);
    }

    #[test]
    fn bare_negative_amount_closes_a_reference() {
        let out = stitch_lines(&["350276 /1207907", "7.80-"]);
        assert_eq!(texts(&out), vec!["350276 /1207907 7.80-"]);
    }

    #[test]
    fn trailing_pending_is_flushed() {
        let out = stitch_lines(&["MILK 3.49", "RAIN CHECK"]);
        assert_eq!(texts(&out), vec!["MILK 3.49", "RAIN CHECK"]);
    }

    #[test]
    fn empty_rows_are_skipped() {
        assert!(stitch_lines(&["", "   "]).is_empty());
    }
}
