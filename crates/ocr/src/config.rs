use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::DEFAULT_ROW_MERGE_MULTIPLIER;
use crate::produce::DEFAULT_MATH_TOLERANCE;
use crate::source::DEFAULT_AUTO_MARGIN;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse parser config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid parser config: {0}")]
    Invalid(String),
}

/// Which OCR representation feeds the line pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Always the provider's linear text.
    Text,
    /// Geometry-reconstructed rows whenever geometry is present.
    Geo,
    /// Geometry only when it scores clearly better than the linear text.
    #[default]
    Auto,
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Text => write!(f, "text"),
            SourceMode::Geo => write!(f, "geo"),
            SourceMode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for SourceMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(SourceMode::Text),
            "geo" => Ok(SourceMode::Geo),
            "auto" => Ok(SourceMode::Auto),
            other => Err(format!("Unknown source mode: '{other}'")),
        }
    }
}

/// Tuning knobs supplied by the caller. The parser reads no environment or
/// files of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Row-merge threshold as a fraction of the median word height.
    pub row_merge_multiplier: f64,
    pub source_mode: SourceMode,
    /// Score lead geometry text needs over linear text in auto mode.
    pub auto_margin: f64,
    /// Below this confidence a receipt is flagged for review.
    pub min_confidence: f32,
    /// Allowed gap between `weight × unit price` and the printed total.
    pub produce_tolerance: Decimal,
    /// Rows at the top of the receipt searched for the vendor.
    pub header_line_count: usize,
    pub default_currency: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            row_merge_multiplier: DEFAULT_ROW_MERGE_MULTIPLIER,
            source_mode: SourceMode::Auto,
            auto_margin: DEFAULT_AUTO_MARGIN,
            min_confidence: 0.85,
            produce_tolerance: DEFAULT_MATH_TOLERANCE,
            header_line_count: 25,
            default_currency: "USD".to_string(),
        }
    }
}

impl ParserConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.row_merge_multiplier > 0.0 && self.row_merge_multiplier.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "row_merge_multiplier must be positive, got {}",
                self.row_merge_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "min_confidence must be within 0..=1, got {}",
                self.min_confidence
            )));
        }
        if self.produce_tolerance.is_sign_negative() && !self.produce_tolerance.is_zero() {
            return Err(ConfigError::Invalid(format!(
                "produce_tolerance must not be negative, got {}",
                self.produce_tolerance
            )));
        }
        if !(self.auto_margin >= 0.0 && self.auto_margin.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "auto_margin must not be negative, got {}",
                self.auto_margin
            )));
        }
        if self.header_line_count == 0 {
            return Err(ConfigError::Invalid("header_line_count must be at least 1".into()));
        }
        Ok(())
    }
}
