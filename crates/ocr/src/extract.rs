//! Receipt-level fields: purchase date, totals block, currency.

use chrono::NaiveDate;
use larder_core::Money;

use crate::tokens::re;
use crate::types::ReceiptSummary;

// ── Compiled regex cache ─────────────────────────────────────────────────────

re!(re_amount_label,
    r"(?i)\b(?:grand\s+total|total\s+due|amount\s+due|balance\s+due|total)\s*[:\$]?\s*\$?\s*([\d,]+\.\d{2})\b");
re!(re_subtotal,
    r"(?i)\bsub\s*-?\s*total\b\s*[:\$]?\s*\$?\s*([\d,]+\.\d{2})\b");
re!(re_tax,
    r"(?i)\b(?:sales\s*tax|tax|hst|gst|pst|vat)\b\s*[:\$]?\s*\$?\s*([\d,]+\.\d{2})\b");
re!(re_dollar_amount,
    r"\$\s*([\d,]+\.\d{2})");
re!(re_currency_code,
    r"\b(USD|CAD|EUR|GBP|AUD)\b");

re!(re_date_month_name,
    r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2}),?\s+(\d{4})\b");
re!(re_date_day_month,
    r"(?i)\b(\d{1,2})\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{4})\b");
re!(re_date_iso,
    r"\b(\d{4})-(\d{2})-(\d{2})\b");
re!(re_date_numeric,
    r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b");

pub struct Extractor;

impl Extractor {
    /// Read the summary fields from the selected source text. The vendor name
    /// comes from retailer resolution and is passed through.
    pub fn summarize(text: &str, vendor: Option<String>, default_currency: &str) -> ReceiptSummary {
        ReceiptSummary {
            vendor,
            purchase_date: Self::extract_date(text),
            currency: Self::extract_currency(text).unwrap_or(default_currency).to_string(),
            subtotal: Self::extract_subtotal(text),
            total: Self::extract_total(text),
            tax: Self::extract_tax(text),
        }
    }

    // ── Date ─────────────────────────────────────────────────────────────────

    /// Most specific pattern first; numeric dates are read month-first.
    fn extract_date(text: &str) -> Option<NaiveDate> {
        let month_first = re_date_month_name().captures(text).and_then(|c| {
            NaiveDate::from_ymd_opt(c[3].parse().ok()?, month_number(&c[1])?, c[2].parse().ok()?)
        });
        let day_first = || {
            re_date_day_month().captures(text).and_then(|c| {
                NaiveDate::from_ymd_opt(c[3].parse().ok()?, month_number(&c[2])?, c[1].parse().ok()?)
            })
        };
        let iso = || {
            re_date_iso().captures(text).and_then(|c| {
                NaiveDate::from_ymd_opt(c[1].parse().ok()?, c[2].parse().ok()?, c[3].parse().ok()?)
            })
        };
        let numeric = || {
            re_date_numeric().captures_iter(text).find_map(|c| {
                let year = expand_year(c[3].parse().ok()?);
                NaiveDate::from_ymd_opt(year, c[1].parse().ok()?, c[2].parse().ok()?)
            })
        };
        month_first.or_else(day_first).or_else(iso).or_else(numeric)
    }

    // ── Amounts ───────────────────────────────────────────────────────────────

    fn extract_total(text: &str) -> Option<Money> {
        // A labeled total beats any raw dollar amount.
        if let Some(m) = re_amount_label().captures_iter(text).find_map(|c| Money::parse_token(&c[1])) {
            return Some(m);
        }
        re_dollar_amount()
            .captures_iter(text)
            .filter_map(|c| Money::parse_token(&c[1]))
            .max()
    }

    fn extract_subtotal(text: &str) -> Option<Money> {
        Money::parse_token(&re_subtotal().captures(text)?[1])
    }

    fn extract_tax(text: &str) -> Option<Money> {
        Money::parse_token(&re_tax().captures(text)?[1])
    }

    fn extract_currency(text: &str) -> Option<&'static str> {
        const CODES: [&str; 5] = ["USD", "CAD", "EUR", "GBP", "AUD"];
        if let Some(c) = re_currency_code().captures(text) {
            return CODES.iter().find(|code| **code == &c[1]).copied();
        }
        if text.contains('€') {
            Some("EUR")
        } else if text.contains('£') {
            Some("GBP")
        } else if text.contains('$') {
            Some("USD")
        } else {
            None
        }
    }
}

fn expand_year(y: i32) -> i32 {
    if y < 100 { 2000 + y } else { y }
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
    let key = name.get(..3)?.to_lowercase();
    MONTHS.iter().position(|m| *m == key).map(|i| i as u32 + 1)
}
