//! Logical lines → structured line items.

use larder_core::{Money, Unit};
use rust_decimal::Decimal;

use crate::repair::DISCOUNT_LABEL;
use crate::tokens::{collapse_whitespace, line_total_token, re, words};
use crate::types::{LogicalLine, ParsedLineItem};
use crate::vendor::VendorResolution;

re!(re_count_at_price, r"(?:^|\s)(\d{1,3})\s*[@xX]\s*\$?(\d+\.\d{2})(?:\s*(?:/\s*)?(?:ea|each))?");
re!(re_leading_sku, r"^(\d{5,8})(?:\s+|$)");
re!(re_barcode, r"^\d{11,14}$");

/// A price the line itself carries, before any fallback.
fn carries_price(line: &LogicalLine) -> bool {
    line_total_token(&line.text).is_some() || line.produce.as_ref().is_some_and(|p| p.line_total.is_some())
}

struct Name {
    text: String,
    vendor_sku: Option<String>,
    barcode: Option<String>,
}

/// Pull the leading register SKU and any standalone barcode out of a name.
fn split_codes(raw: &str) -> Name {
    let mut rest = raw.trim();
    let mut vendor_sku = None;
    if let Some(c) = re_leading_sku().captures(rest) {
        vendor_sku = Some(c[1].to_string());
        rest = &rest[c.get(0).map_or(0, |m| m.end())..];
    }

    let mut barcode = None;
    let kept: Vec<&str> = words(rest)
        .into_iter()
        .map(|(_, w)| w)
        .filter(|w| {
            if re_barcode().is_match(w) {
                barcode.get_or_insert_with(|| w.to_string());
                false
            } else {
                true
            }
        })
        .collect();

    let text = kept.join(" ");
    let text = text.trim_matches(|c: char| c == '-' || c == '*' || c == ':' || c.is_whitespace());
    Name { text: collapse_whitespace(text), vendor_sku, barcode }
}

/// One item for a non-terminal line, or `None` when nothing nameable remains.
pub fn extract_item(line: &LogicalLine) -> Option<ParsedLineItem> {
    if line.is_terminal() {
        return None;
    }
    let text = line.text.as_str();
    let token = line_total_token(text);
    let produce = line.produce.as_ref();

    let line_total = produce
        .and_then(|p| p.line_total)
        .or(token.map(|t| t.value))
        .or_else(|| produce.and_then(|p| p.expected_total()));

    // Anything after the total is flag residue.
    let mut base = match (produce.and_then(|p| p.name_part.as_deref()), token) {
        (Some(name), _) => name.to_string(),
        (None, Some(t)) => text[..t.start].to_string(),
        (None, None) => text.to_string(),
    };

    let mut count_price: Option<(Decimal, Money)> = None;
    if produce.is_none() {
        let hit = re_count_at_price().captures(&base).and_then(|c| {
            let count = c[1].parse::<i64>().ok().filter(|n| *n > 0)?;
            let price = Money::parse_token(&c[2])?;
            Some((Decimal::from(count), price, c.get(0)?.range()))
        });
        if let Some((count, price, range)) = hit {
            base.replace_range(range, " ");
            count_price = Some((count, price));
        }
    }

    let Name { text: mut name, vendor_sku, barcode } = split_codes(&base);
    if name.is_empty() {
        if !line.discount {
            return None;
        }
        name = DISCOUNT_LABEL.to_string();
    }

    let unit_price = produce
        .and_then(|p| p.unit_price)
        .or(count_price.map(|(_, p)| p))
        .or(line_total);

    let (original_quantity, original_unit) = match (produce, count_price) {
        (Some(p), _) => (p.weight, p.unit),
        (None, Some((count, _))) => (Some(count), Some(Unit::Each)),
        (None, None) if line.discount => (None, None),
        (None, None) if line_total.is_some() => (Some(Decimal::ONE), Some(Unit::Each)),
        (None, None) => (None, None),
    };

    Some(ParsedLineItem {
        raw_line_text: line.text.clone(),
        name,
        vendor_sku,
        barcode,
        original_quantity,
        original_unit,
        unit_price,
        line_total,
        produce_meta: line.produce.clone(),
    })
}

/// Items for every line, then the retailer's post-processing.
///
/// Unpriced lines ahead of the first priced line are header text (store
/// name, slogan, address) and yield no item.
pub fn extract_items(lines: &[LogicalLine], vendor: &VendorResolution) -> Vec<ParsedLineItem> {
    let first_priced = lines
        .iter()
        .position(|l| !l.is_terminal() && carries_price(l))
        .unwrap_or(lines.len());

    let items = lines
        .iter()
        .enumerate()
        .filter(|(i, l)| *i >= first_priced || carries_price(l))
        .filter_map(|(_, l)| extract_item(l))
        .collect();
    vendor.postprocess_items(items)
}
