//! Produce priced by weight: `BANANAS 3.04 lb @ 0.54 1.64`.
//!
//! Two passes over logical lines. The first folds a name row, a weight/rate
//! row and an optional bare price row into one line. The second annotates
//! every item line that carries both a unit token and a rate marker.

use larder_core::{Money, Unit};
use rust_decimal::Decimal;
use tracing::trace;

use crate::tokens::{
    collapse_whitespace, has_letters, has_rate_marker, has_unit_token, has_weight_or_rate_signal, line_total_token,
    money_tokens, re, weight_match,
};
use crate::types::{LineKind, LogicalLine, ProduceMeta};

/// Floor for the `weight × unit price` check, 0.02.
pub const DEFAULT_MATH_TOLERANCE: Decimal = Decimal::from_parts(2, 0, 0, false, 2);

// `@ 3/1.00`: price for a count
re!(re_price_for_count, r"@\s*(\d+)\s*/\s*\$?(\d+\.\d{2})");
re!(re_price_at, r"@\s*\$?(\d+\.\d{2})");
re!(re_price_per_unit, r"(?i)\$?(\d+\.\d{2})\s*/\s*(lbs?|kgs?|oz|g|ea|each)\b");

fn is_item(line: &LogicalLine) -> bool {
    line.kind == LineKind::Item && !line.discount
}

fn is_name_only(line: &LogicalLine) -> bool {
    is_item(line)
        && has_letters(&line.text)
        && money_tokens(&line.text).is_empty()
        && !has_weight_or_rate_signal(&line.text)
}

fn is_rate_row(line: &LogicalLine) -> bool {
    is_item(line) && has_unit_token(&line.text) && has_rate_marker(&line.text)
}

fn is_price_only(line: &LogicalLine) -> bool {
    is_item(line)
        && !has_unit_token(&line.text)
        && line_total_token(&line.text).is_some_and(|t| t.prefix(&line.text).is_empty())
}

/// Fold `name` / `weight @ rate` / `price` triples into single lines.
pub fn merge_produce_lines(lines: Vec<LogicalLine>) -> Vec<LogicalLine> {
    let mut out = Vec::with_capacity(lines.len());
    let mut iter = lines.into_iter().peekable();

    while let Some(mut line) = iter.next() {
        if !is_name_only(&line) || !iter.peek().is_some_and(is_rate_row) {
            out.push(line);
            continue;
        }
        let Some(rate_row) = iter.next() else {
            out.push(line);
            continue;
        };
        let priced = line_total_token(&rate_row.text).is_some();
        line.text = format!("{} {}", line.text, rate_row.text);
        if !priced && iter.peek().is_some_and(is_price_only) {
            if let Some(price_row) = iter.next() {
                line.text = format!("{} {}", line.text, price_row.text);
            }
        }
        trace!(text = %line.text, "produce merge");
        line.merged = true;
        line.produce_merged = true;
        out.push(line);
    }
    out
}

/// Unit price and, when the rate names one, its unit.
fn unit_price(text: &str) -> Option<(Money, Option<Unit>, usize)> {
    if let Some(c) = re_price_for_count().captures(text) {
        let count: Decimal = c[1].parse().ok()?;
        let price: Decimal = c[2].parse().ok()?;
        if !count.is_zero() {
            return Some((Money::from_decimal(price / count), None, c.get(0)?.start()));
        }
    }
    if let Some(c) = re_price_at().captures(text) {
        return Some((Money::parse_token(&c[1])?, None, c.get(0)?.start()));
    }
    let c = re_price_per_unit().captures(text)?;
    Some((Money::parse_token(&c[1])?, c[2].parse().ok(), c.get(0)?.start()))
}

/// Weight/rate annotation for one line, or `None` when the line is not sold by weight.
pub fn detect_produce(text: &str, tolerance: Decimal) -> Option<ProduceMeta> {
    if !has_unit_token(text) || !has_rate_marker(text) {
        return None;
    }

    let weight = weight_match(text);
    let rate = unit_price(text);
    let total = line_total_token(text);

    let weight_amount: Option<Decimal> = weight.and_then(|(_, amount, _)| amount.parse().ok());
    let unit = weight
        .and_then(|(_, _, u)| u.parse::<Unit>().ok())
        .filter(|u| u.is_weight())
        .or_else(|| rate.and_then(|(_, u, _)| u));

    let cut = match weight {
        Some((start, _, _)) => start,
        None => [rate.map(|(_, _, s)| s), total.map(|t| t.start)]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(text.len()),
    };
    let name = collapse_whitespace(&text[..cut]);
    let name_part = (!name.is_empty()).then_some(name);

    let mut meta = ProduceMeta {
        weight: weight_amount,
        unit,
        unit_price: rate.map(|(m, _, _)| m),
        line_total: total.map(|t| t.value),
        name_part,
        confidence_score: 0.0,
        math_validated: false,
    };
    meta.confidence_score = score(&mut meta, tolerance);
    Some(meta)
}

/// Completeness score, with the arithmetic check folded in when it can run.
fn score(meta: &mut ProduceMeta, tolerance: Decimal) -> f32 {
    let mut s: f32 = 0.0;
    if meta.weight.is_some() && meta.unit.is_some() {
        s += 0.35;
    }
    if meta.unit_price.is_some() {
        s += 0.35;
    }
    if meta.line_total.is_some() {
        s += 0.20;
    }
    if meta.name_part.is_some() {
        s += 0.10;
    }

    if let (Some(weight), Some(rate), Some(total)) = (meta.weight, meta.unit_price, meta.line_total) {
        let tol = tolerance.max(DEFAULT_MATH_TOLERANCE);
        let gap = (weight * rate.as_decimal() - total.as_decimal()).abs();
        meta.math_validated = gap <= tol;
        s += if meta.math_validated { 0.15 } else { -0.15 };
    }
    s.clamp(0.0, 1.0)
}

/// Both passes.
pub fn apply_produce(lines: Vec<LogicalLine>, tolerance: Decimal) -> Vec<LogicalLine> {
    merge_produce_lines(lines)
        .into_iter()
        .map(|mut line| {
            if is_item(&line) {
                line.produce = detect_produce(&line.text, tolerance);
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_weight_rate_and_total() {
        let meta = detect_produce("BANANAS 3.04 lb @ 0.54 1.64", DEFAULT_MATH_TOLERANCE).unwrap();
        assert_eq!(meta.weight, Some(Decimal::new(304, 2)));
        assert_eq!(meta.unit, Some(Unit::Lb));
        assert_eq!(meta.unit_price, Some(Money::from_cents(54)));
        assert_eq!(meta.line_total, Some(Money::from_cents(164)));
        assert_eq!(meta.name_part.as_deref(), Some("BANANAS"));
        assert!(meta.math_validated);
        assert_eq!(meta.confidence_score, 1.0);
    }

    #[test]
    fn mismatched_math_lowers_the_score() {
        let good = detect_produce("BANANAS 3.04 lb @ 0.54 1.64", DEFAULT_MATH_TOLERANCE).unwrap();
        let bad = detect_produce("BANANAS 3.04 lb @ 0.54 2.50", DEFAULT_MATH_TOLERANCE).unwrap();
        assert!(!bad.math_validated);
        assert!(bad.confidence_score < good.confidence_score);
    }

    #[test]
    fn tolerance_never_drops_below_two_cents() {
        // 3.04 × 0.54 = 1.6416; 1.66 is within 0.02
        let meta = detect_produce("BANANAS 3.04 lb @ 0.54 1.66", Decimal::ZERO).unwrap();
        assert!(meta.math_validated);
        let meta = detect_produce("BANANAS 3.04 lb @ 0.54 1.67", Decimal::ZERO).unwrap();
        assert!(!meta.math_validated);
    }

    #[test]
    fn per_unit_rate_supplies_the_unit() {
        let meta = detect_produce("ROMA TOMATO 1.99/lb 2.35", DEFAULT_MATH_TOLERANCE).unwrap();
        assert_eq!(meta.weight, None);
        assert_eq!(meta.unit, Some(Unit::Lb));
        assert_eq!(meta.unit_price, Some(Money::from_cents(199)));
        assert_eq!(meta.line_total, Some(Money::from_cents(235)));
        assert_eq!(meta.name_part.as_deref(), Some("ROMA TOMATO"));
        assert!(!meta.math_validated);
    }

    #[test]
    fn needs_unit_and_rate_marker() {
        assert!(detect_produce("MILK 3.49", DEFAULT_MATH_TOLERANCE).is_none());
        assert!(detect_produce("2 @ 1.99 3.98", DEFAULT_MATH_TOLERANCE).is_none());
        assert!(detect_produce("FLOUR 5 lb 3.99", DEFAULT_MATH_TOLERANCE).is_none());
    }

    #[test]
    fn merges_split_produce_rows() {
        let lines = vec![
            LogicalLine::item("BANANAS"),
            LogicalLine::item("3.04 lb @ 0.54"),
            LogicalLine::item("1.64"),
            LogicalLine::item("MILK 3.49"),
        ];
        let out = merge_produce_lines(lines);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "BANANAS 3.04 lb @ 0.54 1.64");
        assert!(out[0].produce_merged && out[0].merged);
        assert!(!out[1].produce_merged);
    }

    #[test]
    fn priced_rate_row_does_not_take_the_next_price() {
        let lines = vec![
            LogicalLine::item("BANANAS"),
            LogicalLine::item("3.04 lb @ 0.54 1.64"),
            LogicalLine::item("2.99"),
        ];
        let out = merge_produce_lines(lines);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].text, "2.99");
    }

    #[test]
    fn terminal_lines_are_not_annotated() {
        let out = apply_produce(
            vec![LogicalLine::new("TOTAL 3.04 lb @ 0.54 1.64", LineKind::Terminal)],
            DEFAULT_MATH_TOLERANCE,
        );
        assert!(out[0].produce.is_none());
    }
}
