use tracing::debug;

use crate::clean::clean_raw_lines;
use crate::config::ParserConfig;
use crate::confidence::assess;
use crate::extract::Extractor;
use crate::geometry::{reconstruct_rows, rows_to_text};
use crate::input::ReceiptInput;
use crate::items::extract_items;
use crate::produce::apply_produce;
use crate::repair::repair_lines;
use crate::source::{select_source, SourceChoice};
use crate::stitch::stitch;
use crate::types::{ExtractResult, LogicalLine};
use crate::vendor::{resolve_vendor, VendorResolution};

/// The extraction plus the intermediate state that produced it.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub source: SourceChoice,
    pub vendor: VendorResolution,
    pub logical_lines: Vec<LogicalLine>,
    pub result: ExtractResult,
}

/// Orchestrates: rows → source choice → clean → vendor → stitch → produce →
/// repair → items → summary → confidence.
///
/// Parsing never fails; unusable input yields an empty result flagged for
/// review.
#[derive(Debug, Clone, Default)]
pub struct ReceiptParser {
    config: ParserConfig,
}

impl ReceiptParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn parse(&self, input: &ReceiptInput) -> ExtractResult {
        self.parse_report(input).result
    }

    /// Convenience for linear text only.
    pub fn parse_text(&self, text: &str) -> ExtractResult {
        self.parse(&ReceiptInput::from_text(text))
    }

    pub fn parse_report(&self, input: &ReceiptInput) -> ParseReport {
        let cfg = &self.config;

        // 1. Rebuild visual rows from word geometry.
        let geometry_text = input.has_geometry().then(|| {
            let rows = reconstruct_rows(&input.words(), cfg.row_merge_multiplier);
            debug!(rows = rows.len(), "reconstructed geometry rows");
            rows_to_text(&rows)
        });

        // 2. Pick the working text.
        let source = select_source(
            input.text.as_deref().unwrap_or_default(),
            geometry_text.as_deref(),
            cfg.source_mode,
            cfg.auto_margin,
        );
        debug!(kind = ?source.kind, text_score = source.text_score, geometry_score = ?source.geometry_score, "selected source");

        // 3. Raw lines without blank, URL or page-marker noise.
        let raw: Vec<&str> = source.text.lines().collect();
        let cleaned = clean_raw_lines(&raw);
        if cleaned.is_empty() {
            debug!("no usable lines");
            return ParseReport {
                source,
                vendor: VendorResolution { adapter: None, vendor_name: None, score: 0 },
                logical_lines: vec![],
                result: ExtractResult::empty(&cfg.default_currency),
            };
        }

        // 4. Retailer.
        let vendor = resolve_vendor(&cleaned, &source.text, cfg.header_line_count);
        debug!(vendor = ?vendor.key(), name = ?vendor.vendor_name, score = vendor.score, "resolved vendor");

        // 5-8. Logical lines.
        let logical = stitch(cleaned, &vendor);
        let logical = apply_produce(logical, cfg.produce_tolerance);
        let logical = repair_lines(logical);
        debug!(lines = logical.len(), "stitched logical lines");

        // 9. Items and receipt fields.
        let lines = extract_items(&logical, &vendor);
        let receipt = Extractor::summarize(&source.text, vendor.vendor_name.clone(), &cfg.default_currency);

        // 10. Confidence.
        let (confidence, needs_review) = assess(&receipt, &lines, cfg.min_confidence);
        debug!(items = lines.len(), confidence, needs_review, "parsed receipt");

        ParseReport {
            source,
            vendor,
            logical_lines: logical,
            result: ExtractResult { receipt, lines, confidence, needs_review },
        }
    }
}
