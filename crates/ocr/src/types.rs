use chrono::NaiveDate;
use larder_core::{Money, Unit};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ── Geometry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// A word's bounding polygon, normally four vertices clockwise from top-left.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

impl BoundingBox {
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            vertices: vec![
                Vertex { x, y },
                Vertex { x: x + width, y },
                Vertex { x: x + width, y: y + height },
                Vertex { x, y: y + height },
            ],
        }
    }

    /// `(min_y, max_y)` over all vertices, `None` when the polygon is empty.
    pub fn vertical_extent(&self) -> Option<(f64, f64)> {
        let first = self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first.y, first.y), |(lo, hi), v| (lo.min(v.y), hi.max(v.y))),
        )
    }

    pub fn min_x(&self) -> f64 {
        self.vertices
            .iter()
            .map(|v| v.x)
            .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.min(x))))
            .unwrap_or(0.0)
    }
}

/// One recognized word, flattened out of the page hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bounding_box: BoundingBox,
    pub page_index: usize,
    pub block_index: usize,
    pub paragraph_index: usize,
    pub word_index: usize,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowToken {
    pub x: f64,
    pub text: String,
}

/// A reconstructed visual row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRow {
    pub vertical_center: f64,
    pub tokens: Vec<RowToken>,
    pub text: String,
}

// ── Lines ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// A purchasable entry (or a fragment of one).
    Item,
    /// Totals, tender, cash and header boilerplate. Never merged.
    Terminal,
    /// A negative amount behind a letter-free reference code.
    DiscountReference,
}

/// One reconstructed purchasable row, assembled from one or more raw lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalLine {
    pub text: String,
    pub kind: LineKind,
    pub merged: bool,
    pub produce_merged: bool,
    pub discount: bool,
    pub produce: Option<ProduceMeta>,
}

impl LogicalLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
            merged: false,
            produce_merged: false,
            discount: false,
            produce: None,
        }
    }

    pub fn item(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Item)
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == LineKind::Terminal
    }
}

/// Weight/rate annotation for produce priced by weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceMeta {
    pub weight: Option<Decimal>,
    pub unit: Option<Unit>,
    pub unit_price: Option<Money>,
    pub line_total: Option<Money>,
    pub name_part: Option<String>,
    pub confidence_score: f32,
    pub math_validated: bool,
}

impl ProduceMeta {
    /// `weight × unitPrice` rounded to cents, when both are known.
    pub fn expected_total(&self) -> Option<Money> {
        Some(self.unit_price?.times(self.weight?))
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedLineItem {
    pub raw_line_text: String,
    pub name: String,
    pub vendor_sku: Option<String>,
    pub barcode: Option<String>,
    pub original_quantity: Option<Decimal>,
    pub original_unit: Option<Unit>,
    pub unit_price: Option<Money>,
    pub line_total: Option<Money>,
    pub produce_meta: Option<ProduceMeta>,
}

impl ParsedLineItem {
    pub fn is_priced(&self) -> bool {
        self.line_total.is_some() || self.unit_price.is_some()
    }

    pub fn is_discount(&self) -> bool {
        self.name.starts_with(crate::repair::DISCOUNT_LABEL)
    }
}

/// Receipt-level fields read from the header and totals block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub vendor: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub currency: String,
    pub subtotal: Option<Money>,
    pub total: Option<Money>,
    pub tax: Option<Money>,
}

/// Everything the parser knows about one receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResult {
    pub receipt: ReceiptSummary,
    pub lines: Vec<ParsedLineItem>,
    /// Structural completeness in `[0, 1]`.
    pub confidence: f32,
    pub needs_review: bool,
}

impl ExtractResult {
    /// The result for input that yields no usable lines.
    pub fn empty(currency: &str) -> Self {
        Self {
            receipt: ReceiptSummary { currency: currency.to_string(), ..Default::default() },
            lines: vec![],
            confidence: 0.0,
            needs_review: true,
        }
    }
}
