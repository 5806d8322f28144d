use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{BoundingBox, Word};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Malformed receipt input: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    #[serde(default)]
    pub text: String,
}

/// A word as the vision provider reports it. Some providers give the text
/// directly, others only as per-character symbols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoWord {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl GeoWord {
    pub fn text(&self) -> String {
        match &self.text {
            Some(t) => t.clone(),
            None => self.symbols.iter().map(|s| s.text.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub words: Vec<GeoWord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// What the OCR collaborator hands over for one receipt: a linear text
/// block, a page hierarchy of positioned words, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl ReceiptInput {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), pages: vec![] }
    }

    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn has_geometry(&self) -> bool {
        self.pages.iter().flat_map(|p| &p.blocks).flat_map(|b| &b.paragraphs).any(|p| !p.words.is_empty())
    }

    /// Flatten the hierarchy, numbering each level.
    pub fn words(&self) -> Vec<Word> {
        let mut out = Vec::new();
        for (page_index, page) in self.pages.iter().enumerate() {
            for (block_index, block) in page.blocks.iter().enumerate() {
                for (paragraph_index, paragraph) in block.paragraphs.iter().enumerate() {
                    for (word_index, w) in paragraph.words.iter().enumerate() {
                        out.push(Word {
                            text: w.text(),
                            bounding_box: w.bounding_box.clone(),
                            page_index,
                            block_index,
                            paragraph_index,
                            word_index,
                            confidence: w.confidence,
                        });
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "text": "MILK 3.49",
        "pages": [{
            "blocks": [{
                "paragraphs": [{
                    "words": [
                        {"text": "MILK", "boundingBox": {"vertices": [{"x": 1, "y": 2}, {"x": 9, "y": 2}, {"x": 9, "y": 12}, {"y": 12}]}, "confidence": 0.97},
                        {"symbols": [{"text": "3"}, {"text": "."}, {"text": "4"}, {"text": "9"}], "boundingBox": {"vertices": [{"x": 20, "y": 2}]}}
                    ]
                }]
            }]
        }]
    }"#;

    #[test]
    fn decodes_hierarchy_and_flattens() {
        let input = ReceiptInput::from_json(SAMPLE).unwrap();
        assert_eq!(input.text.as_deref(), Some("MILK 3.49"));
        assert!(input.has_geometry());

        let words = input.words();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "MILK");
        assert_eq!(words[0].confidence, Some(0.97));
        assert_eq!(words[0].bounding_box.vertices[3].x, 0.0);
        assert_eq!(words[1].text, "3.49");
        assert_eq!(words[1].word_index, 1);
    }

    #[test]
    fn text_only_input() {
        let input = ReceiptInput::from_json(r#"{"text": "hello"}"#).unwrap();
        assert!(!input.has_geometry());
        assert!(input.words().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(ReceiptInput::from_json("{not json"), Err(InputError::Json(_))));
    }
}
