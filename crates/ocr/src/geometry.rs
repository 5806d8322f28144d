//! Rebuilds reading-order rows from word-level bounding boxes.
//!
//! Coordinates are quantized to integer milli-units before any comparison so
//! that row assignment does not depend on floating-point rounding.

use crate::tokens::collapse_whitespace;
use crate::types::{RowToken, TextRow, Word};

/// Row-merge threshold never drops below this many units.
const MIN_THRESHOLD: f64 = 3.0;
/// Median height used when no word has a positive height.
const FALLBACK_HEIGHT: f64 = 10.0;
const MILLI: f64 = 1000.0;

pub const DEFAULT_ROW_MERGE_MULTIPLIER: f64 = 0.65;

fn to_milli(v: f64) -> i64 {
    if v.is_finite() {
        (v * MILLI).round() as i64
    } else {
        0
    }
}

struct PlacedWord<'a> {
    center: i64,
    height: i64,
    x: i64,
    text: &'a str,
}

struct RowAcc {
    center_sum: i64,
    count: i64,
    tokens: Vec<(i64, String)>,
}

impl RowAcc {
    fn center(&self) -> i64 {
        self.center_sum / self.count
    }
}

/// Median of positive heights (milli-units), `None` when there are none.
fn median_height(words: &[PlacedWord<'_>]) -> Option<i64> {
    let mut heights: Vec<i64> = words.iter().map(|w| w.height).filter(|&h| h > 0).collect();
    if heights.is_empty() {
        return None;
    }
    heights.sort_unstable();
    let mid = heights.len() / 2;
    Some(if heights.len() % 2 == 0 {
        (heights[mid - 1] + heights[mid]) / 2
    } else {
        heights[mid]
    })
}

/// Group words into rows by vertical center.
///
/// Words may arrive in any order; the result is top-to-bottom, and within a
/// row left-to-right.
pub fn reconstruct_rows(words: &[Word], multiplier: f64) -> Vec<TextRow> {
    let mut placed: Vec<PlacedWord<'_>> = words
        .iter()
        .filter(|w| !w.text.trim().is_empty())
        .filter_map(|w| {
            let (top, bottom) = w.bounding_box.vertical_extent()?;
            Some(PlacedWord {
                center: to_milli((top + bottom) / 2.0),
                height: to_milli(bottom - top),
                x: to_milli(w.bounding_box.min_x()),
                text: w.text.trim(),
            })
        })
        .collect();

    if placed.is_empty() {
        return Vec::new();
    }

    let median = median_height(&placed).unwrap_or(to_milli(FALLBACK_HEIGHT));
    let threshold = to_milli(MIN_THRESHOLD).max((median as f64 * multiplier).round() as i64);

    // Stable: identical keys keep input order.
    placed.sort_by_key(|w| (w.center, w.x));

    let mut rows: Vec<RowAcc> = Vec::new();
    for word in placed {
        let mut best: Option<(usize, i64)> = None;
        for (idx, row) in rows.iter().enumerate().rev() {
            let center = row.center();
            if center < word.center - 2 * threshold {
                break;
            }
            let dist = (center - word.center).abs();
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((idx, dist));
            }
        }

        match best {
            Some((idx, dist)) if dist <= threshold => {
                let row = &mut rows[idx];
                row.center_sum += word.center;
                row.count += 1;
                row.tokens.push((word.x, word.text.to_string()));
            }
            _ => rows.push(RowAcc {
                center_sum: word.center,
                count: 1,
                tokens: vec![(word.x, word.text.to_string())],
            }),
        }
    }

    rows.into_iter()
        .filter_map(|mut row| {
            row.tokens.sort_by_key(|(x, _)| *x);
            let joined = row.tokens.iter().map(|(_, t)| t.as_str()).collect::<Vec<_>>().join(" ");
            let text = collapse_whitespace(&joined);
            if text.is_empty() {
                return None;
            }
            Some(TextRow {
                vertical_center: row.center() as f64 / MILLI,
                tokens: row
                    .tokens
                    .into_iter()
                    .map(|(x, text)| RowToken { x: x as f64 / MILLI, text })
                    .collect(),
                text,
            })
        })
        .collect()
}

/// Rows joined into a newline-separated text block.
pub fn rows_to_text(rows: &[TextRow]) -> String {
    rows.iter().map(|r| r.text.as_str()).collect::<Vec<_>>().join("\n")
}
