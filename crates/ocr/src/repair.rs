//! Last clean-up over logical lines: drop stray letter noise and give
//! negative amounts a uniform discount label.

use tracing::trace;

use crate::tokens::{collapse_whitespace, has_letters, line_total_token, words};
use crate::types::{LineKind, LogicalLine};

pub const DISCOUNT_LABEL: &str = "DISCOUNT";

/// Rows like `A` or `E N`: flag residue with nothing else on it.
fn is_letter_noise(text: &str) -> bool {
    let ws = words(text);
    !ws.is_empty() && ws.iter().all(|(_, w)| w.chars().count() == 1 && w.chars().all(char::is_alphabetic))
}

/// `350276 /1207907` → `1207907`.
fn reference_code(prefix: &str) -> String {
    let code = match prefix.rsplit_once('/') {
        Some((_, after)) if !after.trim().is_empty() => after,
        _ => prefix,
    };
    collapse_whitespace(code)
}

fn strip_label(prefix: &str) -> Option<&str> {
    let head = prefix.get(..DISCOUNT_LABEL.len())?;
    head.eq_ignore_ascii_case(DISCOUNT_LABEL).then(|| &prefix[DISCOUNT_LABEL.len()..])
}

/// `DISCOUNT [ref] -7.80` for a line whose total is negative, `None` otherwise.
pub fn discount_text(text: &str) -> Option<String> {
    let token = line_total_token(text)?;
    if !token.value.is_negative() {
        return None;
    }
    let amount = token.value.to_plain_string();
    let prefix = token.prefix(text);

    let label = if prefix.is_empty() {
        DISCOUNT_LABEL.to_string()
    } else if !has_letters(prefix) {
        format!("{DISCOUNT_LABEL} {}", reference_code(prefix))
    } else if let Some(rest) = strip_label(prefix) {
        collapse_whitespace(&format!("{DISCOUNT_LABEL}{rest}"))
    } else {
        format!("{DISCOUNT_LABEL} {}", collapse_whitespace(prefix))
    };
    Some(format!("{label} {amount}"))
}

pub fn repair_lines(lines: Vec<LogicalLine>) -> Vec<LogicalLine> {
    lines
        .into_iter()
        .filter(|l| l.is_terminal() || !is_letter_noise(&l.text))
        .map(|mut line| {
            if line.is_terminal() {
                return line;
            }
            if let Some(text) = discount_text(&line.text) {
                trace!(from = %line.text, to = %text, "discount");
                line.text = text;
                line.kind = LineKind::Item;
                line.discount = true;
                line.produce = None;
            }
            line
        })
        .collect()
}
