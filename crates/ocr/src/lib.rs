pub mod clean;
pub mod confidence;
pub mod config;
pub mod extract;
pub mod geometry;
pub mod input;
pub mod items;
pub mod pipeline;
pub mod produce;
pub mod repair;
pub mod source;
pub mod stitch;
pub mod tokens;
pub mod types;
pub mod vendor;

pub use config::{ConfigError, ParserConfig, SourceMode};
pub use extract::Extractor;
pub use input::{InputError, ReceiptInput};
pub use pipeline::{ParseReport, ReceiptParser};
pub use source::SourceKind;
pub use types::{ExtractResult, LineKind, LogicalLine, ParsedLineItem, ProduceMeta, ReceiptSummary};
pub use vendor::{VendorAdapter, VendorResolution};
